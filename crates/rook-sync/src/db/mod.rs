//! Record models and schema for the metric store
//!
//! Records are created by the normalizer, handed to the store, and discarded
//! once their batch commits. Persisted state lives only in table rows.

pub mod models;
pub mod schema;

pub use models::*;
