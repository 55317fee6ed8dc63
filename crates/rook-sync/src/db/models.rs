//! Canonical records matching the store's tables

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metric family: one provider endpoint, one record shape, one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    Steps,
    #[value(name = "glucose")]
    BloodGlucose,
    #[value(name = "heart-rate")]
    HeartRate,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 3] = [
        MetricFamily::BloodGlucose,
        MetricFamily::Steps,
        MetricFamily::HeartRate,
    ];

    /// Table name, also used as the family's log label
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Steps => "steps",
            MetricFamily::BloodGlucose => "blood_glucose",
            MetricFamily::HeartRate => "heart_rate",
        }
    }

    /// Trailing window used when a query omits its start bound
    pub fn default_window_days(&self) -> i64 {
        match self {
            MetricFamily::Steps => 30,
            MetricFamily::BloodGlucose | MetricFamily::HeartRate => 7,
        }
    }
}

impl std::fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily step total, identity `(user_id, activity_date)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub user_id: String,
    pub activity_date: NaiveDate,
    pub total_steps: Option<i64>,
}

/// One glucose sample, identity `(user_id, sample_time)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseRecord {
    pub user_id: String,
    pub sample_time: DateTime<Utc>,
    pub mg_dl: Option<i64>,
}

/// Heart-rate and HRV values sharing one timestamp, identity `(user_id, sample_time)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateRecord {
    pub user_id: String,
    pub sample_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv_rmssd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv_sdnn: Option<f64>,
}

impl HeartRateRecord {
    /// Record with every value absent
    pub fn empty(user_id: impl Into<String>, sample_time: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            sample_time,
            bpm: None,
            hrv_rmssd: None,
            hrv_sdnn: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_labels_match_tables() {
        assert_eq!(MetricFamily::Steps.to_string(), "steps");
        assert_eq!(MetricFamily::BloodGlucose.to_string(), "blood_glucose");
        assert_eq!(MetricFamily::HeartRate.to_string(), "heart_rate");
    }

    #[test]
    fn test_default_windows() {
        assert_eq!(MetricFamily::Steps.default_window_days(), 30);
        assert_eq!(MetricFamily::BloodGlucose.default_window_days(), 7);
        assert_eq!(MetricFamily::HeartRate.default_window_days(), 7);
    }

    #[test]
    fn test_heart_rate_json_omits_absent_fields() {
        let ts = DateTime::parse_from_rfc3339("2024-12-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut record = HeartRateRecord::empty("u1", ts);
        record.hrv_rmssd = Some(0.0);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("bpm").is_none());
        assert_eq!(json["hrv_rmssd"], 0.0);
    }
}
