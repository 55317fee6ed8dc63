mod credentials;

pub use credentials::{
    load_dotenv, load_env_file, ProviderCredentials, CLIENT_UUID_VAR, SECRET_KEY_VAR,
};

use crate::error::{Result, RookError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default data directory name
const DATA_DIR_NAME: &str = "rook-sync";

/// Database file name inside the data directory
const DB_FILENAME: &str = "rookie.db";

/// Production API root
pub const DEFAULT_API_BASE: &str = "https://api.rook-connect.review";

/// Per-request timeout for provider calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Get the data directory path for the metric store
/// Returns ~/.local/share/rook-sync on Unix, ~/Library/Application Support/rook-sync on macOS
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or_else(|| RookError::config("Could not determine data directory"))
}

/// Get the default database path
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILENAME))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Settings for the provider client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without the processed-data path
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_base: api_base.into(),
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path() {
        let path = default_db_path().unwrap();
        assert!(path.ends_with("rook-sync/rookie.db"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
