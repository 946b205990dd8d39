use crate::Database;
use crate::models::{ChartRow, UserRow};
use anyhow::{Result, anyhow};
use pulse_types::models::DataPoint;
use rusqlite::{Connection, OptionalExtension};

/// Outcome of a single version-checked replace attempt.
pub enum ConditionalReplace {
    Replaced(ChartRow),
    /// The row exists but its version moved past the expected one.
    Conflict,
    Missing,
}

/// Outcome of the full replace operation, conflicts resolved.
pub enum ReplaceResult {
    Replaced(ChartRow),
    Missing,
    /// The version kept moving for every retry. Callers surface this as
    /// a conflict error; it is not reachable with one broadcaster writer.
    Contended,
}

/// Retry cap for the version-checked replace loop. The only competing
/// writer appends at a fixed period, so one retry normally settles it.
const MAX_REPLACE_ATTEMPTS: u32 = 4;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str, role: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, role) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Charts --

    pub fn create_chart(&self, name: &str, series: &[DataPoint]) -> Result<ChartRow> {
        let series_json = serde_json::to_string(series)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO charts (name, series) VALUES (?1, ?2)",
                (name, &series_json),
            )?;
            let id = conn.last_insert_rowid();
            query_chart(conn, id)?.ok_or_else(|| anyhow!("chart {} missing after insert", id))
        })
    }

    pub fn list_charts(&self) -> Result<Vec<ChartRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, series, version, created_at, updated_at
                 FROM charts
                 ORDER BY created_at DESC, id DESC",
            )?;

            let raw = stmt
                .query_map([], map_chart_raw)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            raw.into_iter().map(chart_from_raw).collect()
        })
    }

    /// Just the ids, for the broadcaster's per-tick sweep.
    pub fn list_chart_ids(&self) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM charts ORDER BY id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn get_chart(&self, id: i64) -> Result<Option<ChartRow>> {
        self.with_conn(|conn| query_chart(conn, id))
    }

    /// Version-checked wholesale replace: one conditional UPDATE that only
    /// lands if the row's version still matches `expected_version`.
    pub fn try_replace_chart(
        &self,
        id: i64,
        name: &str,
        series: &[DataPoint],
        expected_version: i64,
    ) -> Result<ConditionalReplace> {
        let series_json = serde_json::to_string(series)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE charts
                 SET name = ?2, series = ?3, updated_at = datetime('now'), version = version + 1
                 WHERE id = ?1 AND version = ?4",
                (id, name, &series_json, expected_version),
            )?;

            if changed == 1 {
                let row = query_chart(conn, id)?
                    .ok_or_else(|| anyhow!("chart {} missing after replace", id))?;
                return Ok(ConditionalReplace::Replaced(row));
            }

            match query_chart(conn, id)? {
                Some(_) => Ok(ConditionalReplace::Conflict),
                None => Ok(ConditionalReplace::Missing),
            }
        })
    }

    /// Replace a chart's name and series wholesale.
    ///
    /// Resolution against the broadcaster: last writer wins on name and
    /// the series base, but points appended between our baseline read and
    /// the winning write are carried over behind the new series, so a
    /// concurrent append is never silently dropped.
    pub fn replace_chart(&self, id: i64, name: &str, series: &[DataPoint]) -> Result<ReplaceResult> {
        let baseline = match self.get_chart(id)? {
            Some(row) => row,
            None => return Ok(ReplaceResult::Missing),
        };
        self.replace_chart_from(baseline, name, series)
    }

    /// The retry loop behind `replace_chart`, starting from an
    /// already-read baseline row.
    pub(crate) fn replace_chart_from(
        &self,
        mut baseline: ChartRow,
        name: &str,
        series: &[DataPoint],
    ) -> Result<ReplaceResult> {
        let mut merged: Vec<DataPoint> = series.to_vec();

        for _ in 0..MAX_REPLACE_ATTEMPTS {
            match self.try_replace_chart(baseline.id, name, &merged, baseline.version)? {
                ConditionalReplace::Replaced(row) => return Ok(ReplaceResult::Replaced(row)),
                ConditionalReplace::Missing => return Ok(ReplaceResult::Missing),
                ConditionalReplace::Conflict => {
                    let current = match self.get_chart(baseline.id)? {
                        Some(row) => row,
                        None => return Ok(ReplaceResult::Missing),
                    };

                    // The broadcaster only appends, so anything past the
                    // baseline's length is a concurrent append to keep.
                    if current.series.len() > baseline.series.len()
                        && current.series[..baseline.series.len()] == baseline.series[..]
                    {
                        merged.extend_from_slice(&current.series[baseline.series.len()..]);
                    }

                    baseline = current;
                }
            }
        }

        Ok(ReplaceResult::Contended)
    }

    /// Append one point to a chart's series as a single store-level
    /// operation. The array mutation happens inside SQLite, so this can
    /// interleave with a wholesale replace without clobbering it.
    /// Returns false if the chart no longer exists.
    pub fn append_point(&self, id: i64, point: DataPoint) -> Result<bool> {
        let point_json = serde_json::to_string(&point)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE charts
                 SET series = json_insert(series, '$[#]', json(?2)),
                     updated_at = datetime('now'),
                     version = version + 1
                 WHERE id = ?1",
                (id, &point_json),
            )?;
            Ok(changed == 1)
        })
    }

    pub fn delete_chart(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM charts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, role, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

type ChartRaw = (i64, String, String, i64, String, String);

fn map_chart_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChartRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn chart_from_raw((id, name, series, version, created_at, updated_at): ChartRaw) -> Result<ChartRow> {
    let series: Vec<DataPoint> = serde_json::from_str(&series)?;
    Ok(ChartRow {
        id,
        name,
        series,
        version,
        created_at,
        updated_at,
    })
}

fn query_chart(conn: &Connection, id: i64) -> Result<Option<ChartRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, series, version, created_at, updated_at FROM charts WHERE id = ?1",
    )?;

    let raw = stmt.query_row([id], map_chart_raw).optional()?;

    match raw {
        Some(raw) => Ok(Some(chart_from_raw(raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(timestamp: i64, value: f64) -> DataPoint {
        DataPoint { timestamp, value }
    }

    #[test]
    fn create_and_list_roundtrip() {
        let db = Database::open_in_memory().unwrap();

        let series = vec![point(1, 10.0), point(2, 15.0)];
        db.create_chart("cpu", &series).unwrap();
        db.create_chart("memory", &[]).unwrap();
        db.create_chart("disk", &[point(9, 3.5)]).unwrap();

        let charts = db.list_charts().unwrap();
        assert_eq!(charts.len(), 3);

        let cpu = charts.iter().find(|c| c.name == "cpu").unwrap();
        assert_eq!(cpu.series, series);
        for chart in &charts {
            assert!(chart.created_at <= chart.updated_at);
            assert_eq!(chart.version, 1);
        }
    }

    #[test]
    fn get_missing_chart_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_chart(42).unwrap().is_none());
    }

    #[test]
    fn replace_swaps_name_and_series_wholesale() {
        let db = Database::open_in_memory().unwrap();
        let chart = db.create_chart("cpu", &[point(1, 1.0)]).unwrap();

        let replaced = db
            .replace_chart(chart.id, "cpu-renamed", &[point(5, 50.0), point(6, 60.0)])
            .unwrap();

        let row = match replaced {
            ReplaceResult::Replaced(row) => row,
            _ => panic!("expected replace to land"),
        };
        assert_eq!(row.name, "cpu-renamed");
        assert_eq!(row.series, vec![point(5, 50.0), point(6, 60.0)]);
        assert_eq!(row.version, 2);
        assert!(row.created_at <= row.updated_at);
    }

    #[test]
    fn replace_missing_chart_reports_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.replace_chart(7, "ghost", &[]).unwrap(),
            ReplaceResult::Missing
        ));
    }

    #[test]
    fn conditional_replace_detects_stale_version() {
        let db = Database::open_in_memory().unwrap();
        let chart = db.create_chart("cpu", &[point(1, 1.0)]).unwrap();

        assert!(db.append_point(chart.id, point(2, 2.0)).unwrap());

        // version moved 1 -> 2, so a CAS keyed on 1 must refuse
        assert!(matches!(
            db.try_replace_chart(chart.id, "cpu", &[], chart.version).unwrap(),
            ConditionalReplace::Conflict
        ));

        let fresh = db.get_chart(chart.id).unwrap().unwrap();
        assert!(matches!(
            db.try_replace_chart(chart.id, "cpu", &[], fresh.version).unwrap(),
            ConditionalReplace::Replaced(_)
        ));
    }

    #[test]
    fn append_grows_series_in_order() {
        let db = Database::open_in_memory().unwrap();
        let chart = db.create_chart("cpu", &[point(1, 1.0)]).unwrap();

        assert!(db.append_point(chart.id, point(2, 2.0)).unwrap());
        assert!(db.append_point(chart.id, point(2, 2.0)).unwrap()); // duplicates allowed
        assert!(db.append_point(chart.id, point(1, 9.0)).unwrap()); // out of order allowed

        let row = db.get_chart(chart.id).unwrap().unwrap();
        assert_eq!(
            row.series,
            vec![point(1, 1.0), point(2, 2.0), point(2, 2.0), point(1, 9.0)]
        );
        assert_eq!(row.version, 4);
    }

    #[test]
    fn append_to_missing_chart_is_false() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.append_point(99, point(1, 1.0)).unwrap());
    }

    /// The lost-update race, interleaved deterministically: a broadcaster
    /// append lands between the admin's baseline read and the replace
    /// commit. The replace must keep the appended point.
    #[test]
    fn replace_keeps_point_appended_after_baseline_read() {
        let db = Database::open_in_memory().unwrap();
        let chart = db.create_chart("cpu", &[point(0, 0.0)]).unwrap();

        let baseline = db.get_chart(chart.id).unwrap().unwrap();

        // Broadcaster tick sneaks in after the baseline read
        assert!(db.append_point(chart.id, point(3, 30.0)).unwrap());

        let replaced = db
            .replace_chart_from(baseline, "cpu", &[point(1, 10.0), point(2, 20.0)])
            .unwrap();

        let row = match replaced {
            ReplaceResult::Replaced(row) => row,
            _ => panic!("expected replace to land"),
        };
        // New series wins the base, the concurrent append survives at the end
        assert_eq!(
            row.series,
            vec![point(1, 10.0), point(2, 20.0), point(3, 30.0)]
        );
    }

    /// Same race driven by real threads. The interleaving is arbitrary,
    /// but both writes must take effect at the store level and the series
    /// must never be a torn mix.
    #[test]
    fn replace_and_append_race_never_loses_a_write() {
        use std::sync::Arc;

        let db = Arc::new(Database::open_in_memory().unwrap());
        let chart = db.create_chart("cpu", &[point(0, 0.0)]).unwrap();
        let id = chart.id;

        let appender = {
            let db = db.clone();
            std::thread::spawn(move || {
                assert!(db.append_point(id, point(3, 30.0)).unwrap());
            })
        };

        let replaced = db
            .replace_chart(id, "cpu", &[point(1, 10.0), point(2, 20.0)])
            .unwrap();
        assert!(matches!(replaced, ReplaceResult::Replaced(_)));
        appender.join().unwrap();

        let row = db.get_chart(id).unwrap().unwrap();
        let with_append = vec![point(1, 10.0), point(2, 20.0), point(3, 30.0)];
        let without = vec![point(1, 10.0), point(2, 20.0)];
        assert!(
            row.series == with_append || row.series == without,
            "unexpected series after race: {:?}",
            row.series
        );
        // Both the append and the replace bumped the version
        assert!(row.version >= 3);
    }

    #[test]
    fn delete_twice_reports_missing_second_time() {
        let db = Database::open_in_memory().unwrap();
        let chart = db.create_chart("cpu", &[]).unwrap();

        assert!(db.delete_chart(chart.id).unwrap());
        assert!(!db.delete_chart(chart.id).unwrap());
    }

    #[test]
    fn user_lookup_by_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u-1", "a@example.com", "hash", "viewer").unwrap();

        let user = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.role, "viewer");

        assert!(db.get_user_by_email("b@example.com").unwrap().is_none());
    }
}
