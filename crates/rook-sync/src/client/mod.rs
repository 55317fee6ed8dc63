pub mod api;

pub use api::{endpoint_path, DayFetch, RookClient};
