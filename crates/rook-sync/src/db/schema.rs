//! Database schema and migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration v1: one table per metric family
///
/// `sample_time` is stored as fixed-width RFC 3339 UTC text so that string
/// order equals time order. `activity_date` is `YYYY-MM-DD`.
fn migration_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        BEGIN;

        CREATE TABLE IF NOT EXISTS steps (
            user_id TEXT NOT NULL,
            activity_date TEXT NOT NULL,
            total_steps INTEGER,
            PRIMARY KEY (user_id, activity_date)
        );

        CREATE TABLE IF NOT EXISTS blood_glucose (
            user_id TEXT NOT NULL,
            sample_time TEXT NOT NULL,
            mg_dl INTEGER,
            PRIMARY KEY (user_id, sample_time)
        );

        CREATE TABLE IF NOT EXISTS heart_rate (
            user_id TEXT NOT NULL,
            sample_time TEXT NOT NULL,
            bpm INTEGER,
            hrv_rmssd REAL,
            hrv_sdnn REAL,
            PRIMARY KEY (user_id, sample_time)
        );

        INSERT INTO schema_migrations (version) VALUES (1);

        COMMIT;
        "#,
    )?;

    Ok(())
}
