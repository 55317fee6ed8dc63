//! Normalization of provider payloads into canonical records
//!
//! Heart-rate events carry three independently sampled streams (BPM, RMSSD,
//! SDNN). They are joined on the exact sample timestamp: the first sample at a
//! timestamp creates the record, later samples at the same timestamp fill in
//! their own field. A field is only ever set from a reported value, never
//! cleared by a stream that did not report.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::client::DayFetch;
use crate::db::models::{GlucoseRecord, HeartRateRecord, StepRecord};
use crate::models::{GlucoseResponse, HeartRateResponse, StepsResponse};
use crate::storage::UpsertRecord;

/// Which provider stream a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStream {
    Glucose,
    Bpm,
    Rmssd,
    Sdnn,
}

impl std::fmt::Display for SampleStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleStream::Glucose => write!(f, "glucose"),
            SampleStream::Bpm => write!(f, "bpm"),
            SampleStream::Rmssd => write!(f, "rmssd"),
            SampleStream::Sdnn => write!(f, "sdnn"),
        }
    }
}

/// A sample skipped during normalization
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSample {
    pub stream: SampleStream,
    pub datetime: String,
    pub reason: String,
}

/// Records produced from one day's payload plus the samples that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<R> {
    pub records: Vec<R>,
    pub dropped: Vec<DroppedSample>,
}

impl<R> Default for Normalized<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dropped: Vec::new(),
        }
    }
}

/// A decoded day payload that can be turned into canonical records
pub trait Normalize {
    type Record: UpsertRecord;

    fn normalize(&self, user_id: &str, day: NaiveDate) -> Normalized<Self::Record>;
}

/// Normalize a fetch result; no-data yields no records
pub fn normalize_day<T: Normalize>(
    fetch: &DayFetch<T>,
    user_id: &str,
    day: NaiveDate,
) -> Normalized<T::Record> {
    match fetch {
        DayFetch::NoData => Normalized::default(),
        DayFetch::Payload(payload) => payload.normalize(user_id, day),
    }
}

/// Parse a provider sample timestamp (RFC 3339, optional fractional seconds)
pub fn parse_sample_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Insertion-ordered map from timestamp to the record being built for it
struct TimestampMerge<R> {
    index: HashMap<DateTime<Utc>, usize>,
    records: Vec<R>,
}

impl<R> TimestampMerge<R> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            records: Vec::new(),
        }
    }

    /// Record for `ts`, created with `create` on first sight
    fn get_or_create(&mut self, ts: DateTime<Utc>, create: impl FnOnce() -> R) -> &mut R {
        let next = self.records.len();
        let slot = *self.index.entry(ts).or_insert(next);
        if slot == next {
            self.records.push(create());
        }
        &mut self.records[slot]
    }

    fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// Parse one sample and hand its timestamp and value to `apply`, or record why it was dropped
fn merge_sample<V>(
    stream: SampleStream,
    datetime: Option<&str>,
    value: Option<V>,
    dropped: &mut Vec<DroppedSample>,
    apply: impl FnOnce(DateTime<Utc>, V),
) {
    let Some(datetime) = datetime else {
        dropped.push(DroppedSample {
            stream,
            datetime: String::new(),
            reason: "missing timestamp".to_string(),
        });
        return;
    };

    let Some(value) = value else {
        dropped.push(DroppedSample {
            stream,
            datetime: datetime.to_string(),
            reason: "missing value".to_string(),
        });
        return;
    };

    match parse_sample_time(datetime) {
        Ok(ts) => apply(ts, value),
        Err(e) => dropped.push(DroppedSample {
            stream,
            datetime: datetime.to_string(),
            reason: e.to_string(),
        }),
    }
}

impl Normalize for StepsResponse {
    type Record = StepRecord;

    fn normalize(&self, user_id: &str, day: NaiveDate) -> Normalized<StepRecord> {
        Normalized {
            records: vec![StepRecord {
                user_id: user_id.to_string(),
                activity_date: day,
                total_steps: self.steps(),
            }],
            dropped: Vec::new(),
        }
    }
}

impl Normalize for GlucoseResponse {
    type Record = GlucoseRecord;

    fn normalize(&self, user_id: &str, _day: NaiveDate) -> Normalized<GlucoseRecord> {
        let mut merge = TimestampMerge::new();
        let mut dropped = Vec::new();

        for sample in self.samples() {
            merge_sample(
                SampleStream::Glucose,
                sample.datetime.as_deref(),
                sample.value_mg_per_dl,
                &mut dropped,
                |ts, value| {
                    let record = merge.get_or_create(ts, || GlucoseRecord {
                        user_id: user_id.to_string(),
                        sample_time: ts,
                        mg_dl: None,
                    });
                    record.mg_dl = Some(value);
                },
            );
        }

        Normalized {
            records: merge.into_records(),
            dropped,
        }
    }
}

impl Normalize for HeartRateResponse {
    type Record = HeartRateRecord;

    fn normalize(&self, user_id: &str, _day: NaiveDate) -> Normalized<HeartRateRecord> {
        let mut merge = TimestampMerge::new();
        let mut dropped = Vec::new();

        for event in self.events() {
            for sample in &event.bpm_samples {
                merge_sample(SampleStream::Bpm, sample.datetime.as_deref(), sample.bpm, &mut dropped, |ts, bpm| {
                    merge
                        .get_or_create(ts, || HeartRateRecord::empty(user_id, ts))
                        .bpm = Some(bpm);
                });
            }

            for sample in &event.rmssd_samples {
                merge_sample(SampleStream::Rmssd, sample.datetime.as_deref(), sample.value, &mut dropped, |ts, v| {
                    merge
                        .get_or_create(ts, || HeartRateRecord::empty(user_id, ts))
                        .hrv_rmssd = Some(v);
                });
            }

            for sample in &event.sdnn_samples {
                merge_sample(SampleStream::Sdnn, sample.datetime.as_deref(), sample.value, &mut dropped, |ts, v| {
                    merge
                        .get_or_create(ts, || HeartRateRecord::empty(user_id, ts))
                        .hrv_sdnn = Some(v);
                });
            }
        }

        Normalized {
            records: merge.into_records(),
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        parse_sample_time(s).unwrap()
    }

    fn heart_rate(body: serde_json::Value) -> HeartRateResponse {
        serde_json::from_value(body).unwrap()
    }

    fn find(records: &[HeartRateRecord], at: &str) -> HeartRateRecord {
        records
            .iter()
            .find(|r| r.sample_time == ts(at))
            .cloned()
            .unwrap_or_else(|| panic!("no record at {at}"))
    }

    #[test]
    fn test_heart_rate_streams_merge_by_timestamp() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [{
                "heart_rate": {
                    "hr_granular_data_array": [
                        { "hr_bpm_int": 60, "datetime_string": "2024-12-01T10:00:00Z" },
                        { "hr_bpm_int": 62, "datetime_string": "2024-12-01T10:01:00Z" }
                    ],
                    "hrv_rmssd_granular_data_array": [
                        { "hrv_rmssd_float": 41.0, "datetime_string": "2024-12-01T10:01:00Z" },
                        { "hrv_rmssd_float": 39.5, "datetime_string": "2024-12-01T10:02:00Z" }
                    ]
                }
            }]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 3);
        assert!(out.dropped.is_empty());

        let t1 = find(&out.records, "2024-12-01T10:00:00Z");
        assert_eq!((t1.bpm, t1.hrv_rmssd, t1.hrv_sdnn), (Some(60), None, None));

        let t2 = find(&out.records, "2024-12-01T10:01:00Z");
        assert_eq!((t2.bpm, t2.hrv_rmssd, t2.hrv_sdnn), (Some(62), Some(41.0), None));

        let t3 = find(&out.records, "2024-12-01T10:02:00Z");
        assert_eq!((t3.bpm, t3.hrv_rmssd, t3.hrv_sdnn), (None, Some(39.5), None));
    }

    #[test]
    fn test_absent_rmssd_differs_from_zero() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [{
                "heart_rate": {
                    "hr_granular_data_array": [
                        { "hr_bpm_int": 70, "datetime_string": "2024-12-01T11:00:00Z" },
                        { "hr_bpm_int": 71, "datetime_string": "2024-12-01T11:01:00Z" }
                    ],
                    "hrv_rmssd_granular_data_array": [
                        { "hrv_rmssd_float": 0.0, "datetime_string": "2024-12-01T11:01:00Z" }
                    ]
                }
            }]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(find(&out.records, "2024-12-01T11:00:00Z").hrv_rmssd, None);
        assert_eq!(find(&out.records, "2024-12-01T11:01:00Z").hrv_rmssd, Some(0.0));
    }

    #[test]
    fn test_streams_merge_across_events() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [
                { "heart_rate": { "hr_granular_data_array": [
                    { "hr_bpm_int": 58, "datetime_string": "2024-12-01T03:00:00Z" }
                ]}},
                { "heart_rate": { "hrv_sdnn_granular_data_array": [
                    { "hrv_sdnn_float": 48.0, "datetime_string": "2024-12-01T03:00:00Z" }
                ]}}
            ]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].bpm, Some(58));
        assert_eq!(out.records[0].hrv_sdnn, Some(48.0));
    }

    #[test]
    fn test_same_instant_different_offsets_share_identity() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [{
                "heart_rate": {
                    "hr_granular_data_array": [
                        { "hr_bpm_int": 65, "datetime_string": "2024-12-01T12:00:00+02:00" }
                    ],
                    "hrv_rmssd_granular_data_array": [
                        { "hrv_rmssd_float": 30.0, "datetime_string": "2024-12-01T10:00:00.000Z" }
                    ]
                }
            }]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].sample_time, ts("2024-12-01T10:00:00Z"));
    }

    #[test]
    fn test_unparsable_timestamps_are_dropped_and_reported() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [{
                "heart_rate": {
                    "hr_granular_data_array": [
                        { "hr_bpm_int": 60, "datetime_string": "yesterday-ish" },
                        { "hr_bpm_int": 61, "datetime_string": "2024-12-01T10:00:00Z" }
                    ],
                    "hrv_sdnn_granular_data_array": [
                        { "datetime_string": "2024-12-01T10:00:00Z" }
                    ]
                }
            }]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].bpm, Some(61));
        assert_eq!(out.records[0].hrv_sdnn, None);

        assert_eq!(out.dropped.len(), 2);
        assert_eq!(out.dropped[0].stream, SampleStream::Bpm);
        assert_eq!(out.dropped[0].datetime, "yesterday-ish");
        assert_eq!(out.dropped[1].stream, SampleStream::Sdnn);
        assert_eq!(out.dropped[1].reason, "missing value");
    }

    #[test]
    fn test_samples_without_timestamp_are_dropped_alone() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [{
                "heart_rate": {
                    "hr_granular_data_array": [
                        { "hr_bpm_int": 60 },
                        { "hr_bpm_int": 61, "datetime_string": "2024-12-01T10:00:00Z" }
                    ],
                    "hrv_rmssd_granular_data_array": [
                        { "hrv_rmssd_float": 40.0, "datetime_string": null }
                    ]
                }
            }]}}
        }));

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].bpm, Some(61));
        assert_eq!(out.records[0].hrv_rmssd, None);

        assert_eq!(out.dropped.len(), 2);
        assert_eq!(out.dropped[0].stream, SampleStream::Bpm);
        assert_eq!(out.dropped[0].reason, "missing timestamp");
        assert_eq!(out.dropped[1].stream, SampleStream::Rmssd);
        assert_eq!(out.dropped[1].reason, "missing timestamp");
    }

    #[test]
    fn test_glucose_null_timestamp_keeps_rest_of_day() {
        let resp: GlucoseResponse = serde_json::from_value(json!({
            "body_health": { "events": { "blood_glucose_event": [
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 101, "datetime_string": null },
                    { "blood_glucose_mg_per_dL_int": 97, "datetime_string": "2024-12-01T08:05:00Z" }
                ]}}
            ]}}
        }))
        .unwrap();

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].mg_dl, Some(97));
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].stream, SampleStream::Glucose);
        assert_eq!(out.dropped[0].reason, "missing timestamp");
    }

    #[test]
    fn test_empty_events_yield_no_records() {
        let resp = heart_rate(json!({
            "physical_health": { "events": { "heart_rate_event": [ { "heart_rate": {} } ] } }
        }));
        let out = resp.normalize("u1", day());
        assert!(out.records.is_empty());
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn test_glucose_samples_map_one_to_one() {
        let resp: GlucoseResponse = serde_json::from_value(json!({
            "body_health": { "events": { "blood_glucose_event": [
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 101, "datetime_string": "2024-12-01T08:00:00Z" },
                    { "blood_glucose_mg_per_dL_int": 99, "datetime_string": "not a time" },
                    { "blood_glucose_mg_per_dL_int": 97, "datetime_string": "2024-12-01T08:05:00.250Z" }
                ]}}
            ]}}
        }))
        .unwrap();

        let out = resp.normalize("u1", day());
        assert_eq!(
            out.records,
            vec![
                GlucoseRecord {
                    user_id: "u1".to_string(),
                    sample_time: ts("2024-12-01T08:00:00Z"),
                    mg_dl: Some(101),
                },
                GlucoseRecord {
                    user_id: "u1".to_string(),
                    sample_time: ts("2024-12-01T08:05:00.250Z"),
                    mg_dl: Some(97),
                },
            ]
        );
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].stream, SampleStream::Glucose);
    }

    #[test]
    fn test_duplicate_glucose_timestamp_keeps_one_record() {
        let resp: GlucoseResponse = serde_json::from_value(json!({
            "body_health": { "events": { "blood_glucose_event": [
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 101, "datetime_string": "2024-12-01T08:00:00Z" }
                ]}},
                { "blood_glucose": { "blood_glucose_granular_data_array": [
                    { "blood_glucose_mg_per_dL_int": 104, "datetime_string": "2024-12-01T08:00:00Z" }
                ]}}
            ]}}
        }))
        .unwrap();

        let out = resp.normalize("u1", day());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].mg_dl, Some(104));
    }

    #[test]
    fn test_steps_one_record_for_the_requested_day() {
        let resp: StepsResponse = serde_json::from_value(json!({
            "physical_health": { "summary": { "physical_summary": {
                "distance": { "steps_int": 0 }
            }}}
        }))
        .unwrap();

        let out = resp.normalize("u1", day());
        assert_eq!(
            out.records,
            vec![StepRecord {
                user_id: "u1".to_string(),
                activity_date: day(),
                total_steps: Some(0),
            }]
        );
    }

    #[test]
    fn test_no_data_normalizes_to_nothing() {
        let fetch: DayFetch<HeartRateResponse> = DayFetch::NoData;
        let out = normalize_day(&fetch, "u1", day());
        assert!(out.records.is_empty());
    }
}
