//! SQLite-backed metric store
//!
//! Batches are written inside one transaction with one prepared statement.
//! A failure on any record rolls the whole batch back.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::upsert::{sample_time_key, UpsertRecord};
use crate::db::models::{GlucoseRecord, HeartRateRecord, MetricFamily, StepRecord};
use crate::db::schema;
use crate::error::{Result, RookError};

/// SQLite database holding one table per metric family
pub struct MetricStore {
    conn: Connection,
}

impl MetricStore {
    /// Open or create the metric database, creating parent directories as needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::config::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Upsert a batch of records of one family as a single transaction.
    ///
    /// Returns the number of records written. An empty batch opens no
    /// transaction. If any record fails, nothing from the batch is kept and a
    /// [`RookError::Batch`] names the failing record.
    pub fn upsert_batch<R: UpsertRecord>(&mut self, records: &[R]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        // Dropping an uncommitted transaction rolls it back.
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(R::UPSERT_SQL)?;
            for (index, record) in records.iter().enumerate() {
                record
                    .execute(&mut stmt)
                    .map_err(|source| RookError::Batch {
                        family: R::FAMILY,
                        index,
                        source,
                    })?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    /// Upsert a single record outside any explicit transaction
    pub fn upsert<R: UpsertRecord>(&self, record: &R) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(R::UPSERT_SQL)?;
        record.execute(&mut stmt)?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Step totals for `user_id` with `from <= activity_date <= to`, oldest first
    pub fn steps_between(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<StepRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, activity_date, total_steps
             FROM steps
             WHERE user_id = ?1 AND activity_date BETWEEN ?2 AND ?3
             ORDER BY activity_date",
        )?;

        let rows = stmt.query_map(
            params![
                user_id,
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            |row| {
                Ok(StepRecord {
                    user_id: row.get(0)?,
                    activity_date: date_column(row, 1)?,
                    total_steps: row.get(2)?,
                })
            },
        )?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Glucose samples for `user_id` with `start <= sample_time <= end`, oldest first
    pub fn glucose_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GlucoseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, sample_time, mg_dl
             FROM blood_glucose
             WHERE user_id = ?1 AND sample_time BETWEEN ?2 AND ?3
             ORDER BY sample_time",
        )?;

        let rows = stmt.query_map(
            params![user_id, sample_time_key(&start), sample_time_key(&end)],
            |row| {
                Ok(GlucoseRecord {
                    user_id: row.get(0)?,
                    sample_time: timestamp_column(row, 1)?,
                    mg_dl: row.get(2)?,
                })
            },
        )?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Heart-rate rows for `user_id` with `start <= sample_time <= end`, oldest first
    pub fn heart_rate_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, sample_time, bpm, hrv_rmssd, hrv_sdnn
             FROM heart_rate
             WHERE user_id = ?1 AND sample_time BETWEEN ?2 AND ?3
             ORDER BY sample_time",
        )?;

        let rows = stmt.query_map(
            params![user_id, sample_time_key(&start), sample_time_key(&end)],
            |row| {
                Ok(HeartRateRecord {
                    user_id: row.get(0)?,
                    sample_time: timestamp_column(row, 1)?,
                    bpm: row.get(2)?,
                    hrv_rmssd: row.get(3)?,
                    hrv_sdnn: row.get(4)?,
                })
            },
        )?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Number of stored rows for a family
    pub fn count(&self, family: MetricFamily) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", family.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
