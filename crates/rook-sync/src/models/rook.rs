//! Processed-data envelopes returned by the ROOK API
//!
//! Each family has its own nesting. Every container is `#[serde(default)]`
//! so a missing object or array decodes as empty and contributes nothing.

use serde::{Deserialize, Serialize};

/// Metadata block shared by summaries and events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryMetadata {
    #[serde(default, rename = "datetime_string")]
    pub datetime: Option<String>,

    #[serde(default, rename = "sources_of_data_array")]
    pub sources_of_data: Vec<String>,
}

// ============================================================================
// Steps: physical_health/summary
// ============================================================================

/// Daily physical summary envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepsResponse {
    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub client_uuid: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub physical_health: PhysicalSummaryHealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalSummaryHealth {
    #[serde(default)]
    pub summary: PhysicalSummaryWrapper,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalSummaryWrapper {
    #[serde(default)]
    pub physical_summary: PhysicalSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalSummary {
    #[serde(default)]
    pub distance: StepDistance,

    #[serde(default)]
    pub metadata: SummaryMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDistance {
    /// Step count for the day; absent when the provider has no figure
    #[serde(default, rename = "steps_int")]
    pub steps: Option<i64>,
}

impl StepsResponse {
    /// Reported step count, if any
    pub fn steps(&self) -> Option<i64> {
        self.physical_health.summary.physical_summary.distance.steps
    }
}

// ============================================================================
// Blood glucose: body_health/events/blood_glucose
// ============================================================================

/// Body health blood glucose events envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlucoseResponse {
    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub data_structure: Option<String>,

    #[serde(default)]
    pub client_uuid: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub body_health: GlucoseBodyHealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlucoseBodyHealth {
    #[serde(default)]
    pub events: GlucoseEvents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlucoseEvents {
    #[serde(default, rename = "blood_glucose_event")]
    pub blood_glucose_event: Vec<GlucoseEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlucoseEvent {
    #[serde(default)]
    pub metadata: SummaryMetadata,

    #[serde(default)]
    pub blood_glucose: GlucoseData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlucoseData {
    #[serde(default, rename = "blood_glucose_avg_mg_per_dL_int")]
    pub average_mg_per_dl: Option<i64>,

    #[serde(default, rename = "blood_glucose_granular_data_array")]
    pub samples: Vec<GlucoseSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlucoseSample {
    #[serde(default, rename = "blood_glucose_mg_per_dL_int")]
    pub value_mg_per_dl: Option<i64>,

    #[serde(default, rename = "datetime_string")]
    pub datetime: Option<String>,
}

impl GlucoseResponse {
    /// Iterate every granular sample across all events
    pub fn samples(&self) -> impl Iterator<Item = &GlucoseSample> {
        self.body_health
            .events
            .blood_glucose_event
            .iter()
            .flat_map(|event| event.blood_glucose.samples.iter())
    }
}

// ============================================================================
// Heart rate: physical_health/events/heart_rate
// ============================================================================

/// Physical health heart rate events envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRateResponse {
    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub client_uuid: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub physical_health: HeartRatePhysicalHealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRatePhysicalHealth {
    #[serde(default)]
    pub events: HeartRateEvents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRateEvents {
    #[serde(default)]
    pub heart_rate_event: Vec<HeartRateEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRateEvent {
    #[serde(default)]
    pub metadata: SummaryMetadata,

    #[serde(default)]
    pub heart_rate: HeartRateData,
}

/// Per-event aggregates plus three independently timestamped sample arrays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartRateData {
    #[serde(default, rename = "hr_avg_bpm_int")]
    pub average_bpm: Option<i64>,

    #[serde(default, rename = "hr_minimum_bpm_int")]
    pub min_bpm: Option<i64>,

    #[serde(default, rename = "hr_maximum_bpm_int")]
    pub max_bpm: Option<i64>,

    #[serde(default, rename = "hr_resting_bpm_int")]
    pub resting_bpm: Option<i64>,

    #[serde(default, rename = "hr_granular_data_array")]
    pub bpm_samples: Vec<BpmSample>,

    #[serde(default, rename = "hrv_rmssd_granular_data_array")]
    pub rmssd_samples: Vec<RmssdSample>,

    #[serde(default, rename = "hrv_sdnn_granular_data_array")]
    pub sdnn_samples: Vec<SdnnSample>,

    #[serde(default, rename = "hrv_avg_rmssd_float")]
    pub avg_rmssd: Option<f64>,

    #[serde(default, rename = "hrv_avg_sdnn_float")]
    pub avg_sdnn: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BpmSample {
    #[serde(default, rename = "hr_bpm_int")]
    pub bpm: Option<i64>,

    #[serde(default, rename = "datetime_string")]
    pub datetime: Option<String>,

    #[serde(default, rename = "interval_duration_seconds_float")]
    pub interval_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmssdSample {
    #[serde(default, rename = "hrv_rmssd_float")]
    pub value: Option<f64>,

    #[serde(default, rename = "datetime_string")]
    pub datetime: Option<String>,

    #[serde(default, rename = "interval_duration_seconds_float")]
    pub interval_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdnnSample {
    #[serde(default, rename = "hrv_sdnn_float")]
    pub value: Option<f64>,

    #[serde(default, rename = "datetime_string")]
    pub datetime: Option<String>,

    #[serde(default, rename = "interval_duration_seconds_float")]
    pub interval_secs: Option<f64>,
}

impl HeartRateResponse {
    /// Heart-rate payloads of every event, in provider order
    pub fn events(&self) -> impl Iterator<Item = &HeartRateData> {
        self.physical_health
            .events
            .heart_rate_event
            .iter()
            .map(|event| &event.heart_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_steps_response_parsing() {
        let body = json!({
            "version": 2,
            "user_id": "u1",
            "physical_health": {
                "summary": {
                    "physical_summary": {
                        "distance": { "steps_int": 8123 },
                        "metadata": {
                            "datetime_string": "2024-12-01T00:00:00Z",
                            "sources_of_data_array": ["Oura"]
                        }
                    }
                }
            }
        });

        let resp: StepsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.steps(), Some(8123));
        assert_eq!(
            resp.physical_health.summary.physical_summary.metadata.sources_of_data,
            vec!["Oura".to_string()]
        );
    }

    #[test]
    fn test_steps_missing_count_is_absent() {
        let body = json!({ "physical_health": { "summary": { "physical_summary": {} } } });
        let resp: StepsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.steps(), None);
    }

    #[test]
    fn test_glucose_samples_flatten_across_events() {
        let body = json!({
            "body_health": { "events": { "blood_glucose_event": [
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 101, "datetime_string": "2024-12-01T08:00:00Z" }
                ]}},
                { "blood_glucose": {} },
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 97, "datetime_string": "2024-12-01T09:00:00Z" },
                    { "blood_glucose_mg_per_dL_int": 95, "datetime_string": "2024-12-01T09:05:00Z" }
                ]}}
            ]}}
        });

        let resp: GlucoseResponse = serde_json::from_value(body).unwrap();
        let values: Vec<_> = resp.samples().map(|s| s.value_mg_per_dl).collect();
        assert_eq!(values, vec![Some(101), Some(97), Some(95)]);
    }

    #[test]
    fn test_heart_rate_event_without_arrays() {
        let body = json!({
            "physical_health": { "events": { "heart_rate_event": [
                { "heart_rate": { "hr_avg_bpm_int": 62 } }
            ]}}
        });

        let resp: HeartRateResponse = serde_json::from_value(body).unwrap();
        let event = resp.events().next().unwrap();
        assert_eq!(event.average_bpm, Some(62));
        assert!(event.bpm_samples.is_empty());
        assert!(event.rmssd_samples.is_empty());
        assert!(event.sdnn_samples.is_empty());
    }

    #[test]
    fn test_sample_without_timestamp_still_decodes() {
        let body = r#"{
            "physical_health": { "events": { "heart_rate_event": [
                { "heart_rate": { "hr_granular_data_array": [
                    {"hr_bpm_int": 60},
                    {"hr_bpm_int": 61, "datetime_string": "2024-12-01T10:00:00Z"},
                    {"hr_bpm_int": 62, "datetime_string": null}
                ]}}
            ]}}
        }"#;

        let resp: HeartRateResponse = serde_json::from_str(body).unwrap();
        let samples = &resp.events().next().unwrap().bpm_samples;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].datetime, None);
        assert_eq!(samples[1].datetime.as_deref(), Some("2024-12-01T10:00:00Z"));
        assert_eq!(samples[2].datetime, None);
    }

    #[test]
    fn test_empty_envelope_decodes() {
        let resp: HeartRateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.events().count(), 0);
    }
}
