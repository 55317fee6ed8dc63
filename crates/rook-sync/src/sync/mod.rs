//! Ingestion driver for ROOK metrics
//!
//! Provides:
//! - Day-by-day fetching over an inclusive date range
//! - Normalization of each day's payload into canonical records
//! - Per-day or end-of-range batch upserts into the metric store
//!
//! Days are processed strictly in order, one request and one transaction at
//! a time. A day that fails to fetch, or a batch that fails to commit, is
//! logged and counted; the remaining days still run. Nothing is retried.

pub mod normalize;

use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::client::RookClient;
use crate::db::models::MetricFamily;
use crate::error::{Result, RookError};
use crate::models::{GlucoseResponse, HeartRateResponse, StepsResponse};
use crate::storage::{MetricStore, UpsertRecord};

pub use normalize::{normalize_day, DroppedSample, Normalize, Normalized, SampleStream};

/// When normalized records are written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FlushPolicy {
    /// One transaction per day with data
    PerDay,
    /// Accumulate across the range, one transaction at the end
    AtRangeEnd,
}

impl FlushPolicy {
    /// Policy each family uses unless told otherwise
    pub fn default_for(family: MetricFamily) -> Self {
        match family {
            MetricFamily::Steps => FlushPolicy::AtRangeEnd,
            MetricFamily::BloodGlucose | MetricFamily::HeartRate => FlushPolicy::PerDay,
        }
    }
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(RookError::invalid_range(format!(
                "start {} is after end {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// `[end - days_back, end]`
    pub fn trailing(end: NaiveDate, days_back: i64) -> Self {
        Self {
            from: end - Duration::days(days_back),
            to: end,
        }
    }

    /// Every day in the range, oldest first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }

    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// Days walked back from today by the full sync, per family
pub fn sync_lookback_days(family: MetricFamily) -> i64 {
    match family {
        MetricFamily::Steps => 29,
        MetricFamily::BloodGlucose | MetricFamily::HeartRate => 7,
    }
}

/// Outcome counters for one ingestion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Days the provider returned a payload for
    pub days_fetched: u32,
    /// Days the provider reported no data for
    pub days_no_data: u32,
    /// Days whose request or decode failed
    pub days_failed: u32,
    /// Samples skipped during normalization
    pub samples_dropped: u32,
    /// Records committed to the store
    pub records_written: u32,
    /// Batches rolled back
    pub flushes_failed: u32,
}

impl IngestReport {
    pub fn has_failures(&self) -> bool {
        self.days_failed > 0 || self.flushes_failed > 0
    }
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fetched: {}, No data: {}, Failed: {}, Written: {}",
            self.days_fetched, self.days_no_data, self.days_failed, self.records_written
        )?;
        if self.samples_dropped > 0 {
            write!(f, ", Dropped samples: {}", self.samples_dropped)?;
        }
        if self.flushes_failed > 0 {
            write!(f, ", Failed batches: {}", self.flushes_failed)?;
        }
        Ok(())
    }
}

/// Drives fetch, normalize and upsert for one user over a date range
pub struct Ingestor {
    client: RookClient,
    store: MetricStore,
}

impl Ingestor {
    pub fn new(client: RookClient, store: MetricStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Release the store, closing its connection when dropped
    pub fn into_store(self) -> MetricStore {
        self.store
    }

    /// Ingest one family for `user_id` over `range`
    #[instrument(skip(self, range), fields(from = %range.from, to = %range.to))]
    pub async fn ingest(
        &mut self,
        family: MetricFamily,
        user_id: &str,
        range: DateRange,
        policy: FlushPolicy,
    ) -> IngestReport {
        let report = match family {
            MetricFamily::Steps => {
                self.ingest_family::<StepsResponse>(family, user_id, range, policy)
                    .await
            }
            MetricFamily::BloodGlucose => {
                self.ingest_family::<GlucoseResponse>(family, user_id, range, policy)
                    .await
            }
            MetricFamily::HeartRate => {
                self.ingest_family::<HeartRateResponse>(family, user_id, range, policy)
                    .await
            }
        };

        info!(%report, "ingestion finished");
        report
    }

    /// Ingest every family over its trailing window ending at `today`
    pub async fn sync_all(
        &mut self,
        user_id: &str,
        today: NaiveDate,
    ) -> Vec<(MetricFamily, IngestReport)> {
        let mut reports = Vec::with_capacity(MetricFamily::ALL.len());
        for family in MetricFamily::ALL {
            let range = DateRange::trailing(today, sync_lookback_days(family));
            let report = self
                .ingest(family, user_id, range, FlushPolicy::default_for(family))
                .await;
            reports.push((family, report));
        }
        reports
    }

    async fn ingest_family<T>(
        &mut self,
        family: MetricFamily,
        user_id: &str,
        range: DateRange,
        policy: FlushPolicy,
    ) -> IngestReport
    where
        T: Normalize + DeserializeOwned,
    {
        let mut report = IngestReport::default();
        let mut pending: Vec<T::Record> = Vec::new();

        for day in range.days() {
            let fetch = match self.client.fetch_day::<T>(family, user_id, day).await {
                Ok(fetch) => fetch,
                Err(e) => {
                    warn!(%family, %day, error = %e, "fetch failed, skipping day");
                    report.days_failed += 1;
                    continue;
                }
            };

            if fetch.is_no_data() {
                info!(%family, %day, "no data");
                report.days_no_data += 1;
                continue;
            }
            report.days_fetched += 1;

            let normalized = normalize_day(&fetch, user_id, day);
            for sample in &normalized.dropped {
                warn!(
                    %family,
                    %day,
                    stream = %sample.stream,
                    datetime = %sample.datetime,
                    reason = %sample.reason,
                    "dropped sample"
                );
            }
            report.samples_dropped += normalized.dropped.len() as u32;

            match policy {
                FlushPolicy::PerDay => {
                    self.flush(family, Some(day), &normalized.records, &mut report)
                }
                FlushPolicy::AtRangeEnd => pending.extend(normalized.records),
            }
        }

        if policy == FlushPolicy::AtRangeEnd {
            self.flush(family, None, &pending, &mut report);
        }

        report
    }

    fn flush<R: UpsertRecord>(
        &mut self,
        family: MetricFamily,
        day: Option<NaiveDate>,
        records: &[R],
        report: &mut IngestReport,
    ) {
        match self.store.upsert_batch(records) {
            Ok(written) => {
                debug!(%family, ?day, written, "batch committed");
                report.records_written += written as u32;
            }
            Err(e) => {
                error!(%family, ?day, records = records.len(), error = %e, "batch rolled back");
                report.flushes_failed += 1;
            }
        }
    }
}
