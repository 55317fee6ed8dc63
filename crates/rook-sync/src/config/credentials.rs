//! Provider credential pair, read from the environment per request

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Environment variable holding the client UUID (basic-auth user)
pub const CLIENT_UUID_VAR: &str = "ROOK_CLIENT_UUID";

/// Environment variable holding the secret key (basic-auth password)
pub const SECRET_KEY_VAR: &str = "ROOK_SECRET_KEY";

/// Basic-auth credentials for the ROOK API.
///
/// Missing variables become empty strings; the provider rejects the request
/// and the failure surfaces as an API error for that day.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_uuid: String,
    pub secret_key: String,
}

impl ProviderCredentials {
    pub fn new(client_uuid: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client_uuid: client_uuid.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read the pair from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            client_uuid: lookup(CLIENT_UUID_VAR).unwrap_or_default(),
            secret_key: lookup(SECRET_KEY_VAR).unwrap_or_default(),
        }
    }
}

/// Load `.env` from the working directory or one of its parents.
///
/// Variables already set in the process are not overridden. A missing file is
/// not an error. Returns the path that was loaded.
pub fn load_dotenv() -> Option<PathBuf> {
    report_env_file(dotenvy::dotenv())
}

/// Load variables from a specific env file
pub fn load_env_file(path: &Path) -> Option<PathBuf> {
    report_env_file(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn report_env_file(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded env file");
            Some(path)
        }
        Err(e) if e.not_found() => {
            debug!("no .env file found");
            None
        }
        Err(e) => {
            warn!(error = %e, "failed to load env file");
            None
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_uuid", &self.client_uuid)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
