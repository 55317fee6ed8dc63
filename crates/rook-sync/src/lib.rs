//! rook-sync: ingest ROOK health metrics into a local SQLite store
//!
//! Steps, blood glucose and heart-rate data are fetched one day at a time,
//! normalized into canonical records and upserted so that re-running an
//! ingestion over the same days converges to the same stored state.

pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod storage;
pub mod sync;

pub use client::RookClient;
pub use db::models::MetricFamily;
pub use error::{Result, RookError};
pub use storage::MetricStore;
pub use sync::{DateRange, FlushPolicy, IngestReport, Ingestor};
