//! Database row types, mapping directly to SQLite rows. Kept distinct
//! from the pulse-types API models so the DB layer stays independent;
//! timestamps stay in SQLite's text form until the API boundary.

use pulse_types::models::DataPoint;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct ChartRow {
    pub id: i64,
    pub name: String,
    pub series: Vec<DataPoint>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}
