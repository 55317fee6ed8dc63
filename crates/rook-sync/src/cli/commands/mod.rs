pub mod ingest;
pub mod query;
pub mod status;

pub use ingest::{run as ingest, sync};
pub use query::run as query;
pub use status::run as status;
