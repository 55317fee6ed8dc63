use thiserror::Error;

use crate::db::models::MetricFamily;

/// Main error type for rook-sync
#[derive(Error, Debug)]
pub enum RookError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{family} batch failed at record {index}: {source}")]
    Batch {
        family: MetricFamily,
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid date format: {0}. Expected YYYY-MM-DD or RFC 3339")]
    InvalidDateFormat(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, RookError>;

impl RookError {
    /// Create an invalid response error from a message
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid range error from a message
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create an invalid parameter error from a message
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// True when the error came from a rolled-back batch
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, Self::Batch { .. })
    }
}

/// Render an error for terminal output, with a hint where one helps
pub fn format_user_error(err: &RookError) -> String {
    match err {
        RookError::Api { status: 401, .. } | RookError::Api { status: 403, .. } => format!(
            "{err}\nHint: check ROOK_CLIENT_UUID and ROOK_SECRET_KEY"
        ),
        RookError::Database(_) | RookError::Batch { .. } => {
            format!("{err}\nHint: check the --db path is writable")
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RookError::Api {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");
    }

    #[test]
    fn test_invalid_date_format_error() {
        let err = RookError::InvalidDateFormat("not-a-date".to_string());
        assert!(err.to_string().contains("not-a-date"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_batch_error_names_family_and_index() {
        let err = RookError::Batch {
            family: MetricFamily::HeartRate,
            index: 2,
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.is_batch_failure());
        assert!(err.to_string().starts_with("heart_rate batch failed at record 2"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            RookError::invalid_response("bad"),
            RookError::InvalidResponse(_)
        ));
        assert!(matches!(RookError::config("bad"), RookError::Config(_)));
        assert!(matches!(
            RookError::invalid_range("bad"),
            RookError::InvalidRange(_)
        ));
        assert!(matches!(
            RookError::invalid_param("bad"),
            RookError::InvalidParameter(_)
        ));
    }

    #[test]
    fn test_auth_errors_get_credential_hint() {
        let err = RookError::Api {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(format_user_error(&err).contains("ROOK_CLIENT_UUID"));
    }
}
