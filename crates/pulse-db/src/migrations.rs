use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'viewer',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- series is a JSON array of {timestamp, value} pairs. version is
        -- the optimistic marker every mutating write must bump; writers
        -- that replace wholesale key on it (see queries::try_replace_chart).
        CREATE TABLE IF NOT EXISTS charts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            series      TEXT NOT NULL DEFAULT '[]',
            version     INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_charts_created
            ON charts(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
