//! Storage layer for ingested metrics
//!
//! ## Layout
//!
//! A single SQLite file (default `~/.local/share/rook-sync/rookie.db`) with
//! one table per metric family:
//!
//! ```text
//! steps          (user_id, activity_date) -> total_steps
//! blood_glucose  (user_id, sample_time)   -> mg_dl
//! heart_rate     (user_id, sample_time)   -> bpm, hrv_rmssd, hrv_sdnn
//! ```
//!
//! Value columns are nullable. Writes are upserts keyed by the identity
//! columns, so re-running an ingestion over the same days is idempotent.

mod metric_store;
mod upsert;

pub use metric_store::MetricStore;
pub use upsert::{sample_time_key, UpsertRecord};
