//! Time-range resolution for reading stored metrics
//!
//! Bounds accept either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
//! (midnight UTC). A missing end defaults to now; a missing start defaults to
//! the end minus the family's window.
//!
//! Results are returned as points scoped to one user, so they drop `user_id`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::models::{GlucoseRecord, HeartRateRecord, MetricFamily, StepRecord};
use crate::error::{Result, RookError};

/// One day's step total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepsPoint {
    pub activity_date: NaiveDate,
    pub total_steps: Option<i64>,
}

/// One glucose sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucosePoint {
    pub sample_time: DateTime<Utc>,
    pub mg_dl: Option<i64>,
}

/// Heart-rate values at one timestamp; absent values are omitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRatePoint {
    pub sample_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_rmssd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_sdnn: Option<f64>,
}

impl From<StepRecord> for StepsPoint {
    fn from(record: StepRecord) -> Self {
        Self {
            activity_date: record.activity_date,
            total_steps: record.total_steps,
        }
    }
}

impl From<GlucoseRecord> for GlucosePoint {
    fn from(record: GlucoseRecord) -> Self {
        Self {
            sample_time: record.sample_time,
            mg_dl: record.mg_dl,
        }
    }
}

impl From<HeartRateRecord> for HeartRatePoint {
    fn from(record: HeartRateRecord) -> Self {
        Self {
            sample_time: record.sample_time,
            bpm: record.bpm,
            hrv_rmssd: record.hrv_rmssd,
            hrv_sdnn: record.hrv_sdnn,
        }
    }
}

/// Convert stored records into response points, keeping order
pub fn to_points<R, P: From<R>>(records: Vec<R>) -> Vec<P> {
    records.into_iter().map(P::from).collect()
}

/// Parse a single range bound
pub fn parse_bound(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RookError::InvalidDateFormat(input.to_string()))
}

/// Resolve optional bounds into a concrete `[start, end]` window
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end = match end {
        Some(raw) => parse_bound(raw)?,
        None => now,
    };
    let start = match start {
        Some(raw) => parse_bound(raw)?,
        None => end - Duration::days(window_days),
    };

    if start > end {
        return Err(RookError::invalid_range("start must be before end"));
    }
    Ok((start, end))
}

/// [`resolve_range`] with the family's default window
pub fn resolve_family_range(
    family: MetricFamily,
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    resolve_range(start, end, family.default_window_days(), now)
}
