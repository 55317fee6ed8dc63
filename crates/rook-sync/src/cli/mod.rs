//! Command-line surface

pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use crate::client::RookClient;
use crate::config::{default_db_path, ClientConfig};
use crate::error::{Result, RookError};
use crate::storage::MetricStore;

/// Settings shared by every command, resolved from global flags
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub db_path: PathBuf,
    pub client: ClientConfig,
}

impl CommandContext {
    pub fn new(db_path: Option<PathBuf>, api_base: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => default_db_path()?,
        };

        let mut client = ClientConfig::default();
        if let Some(base) = api_base {
            client.api_base = base;
        }
        if let Some(secs) = timeout_secs {
            client.timeout = Duration::from_secs(secs);
        }

        Ok(Self { db_path, client })
    }

    pub fn open_store(&self) -> Result<MetricStore> {
        MetricStore::open(&self.db_path)
    }

    pub fn client(&self) -> Result<RookClient> {
        RookClient::new(&self.client)
    }
}

/// Reject blank user ids before any request is made
pub fn require_user_id(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RookError::invalid_param("user id must not be empty"));
    }
    Ok(trimmed)
}
