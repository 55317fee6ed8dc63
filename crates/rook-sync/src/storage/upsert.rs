//! Per-family upsert statements
//!
//! Every statement overwrites all non-key columns from `excluded`, so the
//! newest record for an identity wins in full, nulls included.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Statement};

use crate::db::models::{GlucoseRecord, HeartRateRecord, MetricFamily, StepRecord};

/// A record that can be written with its family's upsert statement
pub trait UpsertRecord {
    /// Family the record belongs to
    const FAMILY: MetricFamily;

    /// Parameterized `INSERT .. ON CONFLICT .. DO UPDATE` statement
    const UPSERT_SQL: &'static str;

    /// Bind this record to a statement prepared from [`Self::UPSERT_SQL`] and run it
    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

/// Text form of a sample timestamp as stored in `sample_time`.
///
/// Fixed nanosecond precision and a `Z` suffix keep the column sortable as text.
pub fn sample_time_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

const UPSERT_STEPS: &str = "
    INSERT INTO steps (user_id, activity_date, total_steps)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(user_id, activity_date) DO UPDATE SET
        total_steps = excluded.total_steps";

const UPSERT_BLOOD_GLUCOSE: &str = "
    INSERT INTO blood_glucose (user_id, sample_time, mg_dl)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(user_id, sample_time) DO UPDATE SET
        mg_dl = excluded.mg_dl";

const UPSERT_HEART_RATE: &str = "
    INSERT INTO heart_rate (user_id, sample_time, bpm, hrv_rmssd, hrv_sdnn)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(user_id, sample_time) DO UPDATE SET
        bpm = excluded.bpm,
        hrv_rmssd = excluded.hrv_rmssd,
        hrv_sdnn = excluded.hrv_sdnn";

impl UpsertRecord for StepRecord {
    const FAMILY: MetricFamily = MetricFamily::Steps;
    const UPSERT_SQL: &'static str = UPSERT_STEPS;

    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.user_id,
            self.activity_date.format("%Y-%m-%d").to_string(),
            self.total_steps,
        ])
    }
}

impl UpsertRecord for GlucoseRecord {
    const FAMILY: MetricFamily = MetricFamily::BloodGlucose;
    const UPSERT_SQL: &'static str = UPSERT_BLOOD_GLUCOSE;

    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.user_id,
            sample_time_key(&self.sample_time),
            self.mg_dl,
        ])
    }
}

impl UpsertRecord for HeartRateRecord {
    const FAMILY: MetricFamily = MetricFamily::HeartRate;
    const UPSERT_SQL: &'static str = UPSERT_HEART_RATE;

    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.user_id,
            sample_time_key(&self.sample_time),
            self.bpm,
            self.hrv_rmssd,
            self.hrv_sdnn,
        ])
    }
}
