//! Error types for the New Relic API client.

use std::time::Duration;
use thiserror::Error;

/// Specialized result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Base error type for New Relic operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid client configuration (e.g. empty API key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Conflicting or missing call parameters.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("API error: {0}")]
    Remote(#[from] RemoteError),

    /// A metric requested by name was absent from an otherwise successful response.
    #[error("Metric not found in response: {name}")]
    MetricNotFound { name: String },

    /// The request could not be completed at the HTTP level.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,
}

/// Raised when the API returns a failure status or a body the client cannot use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (status {status_code})")]
pub struct RemoteError {
    pub message: String,
    pub status_code: u16,
    /// Raw response body, unparsed.
    pub body: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            body: body.into(),
        }
    }

    /// True when the service rejected the API key.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status_code, 401 | 403)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_includes_status() {
        let err = Error::from(RemoteError::new("Invalid API key", 401, "{}"));
        assert_eq!(err.to_string(), "API error: Invalid API key (status 401)");
    }

    #[test]
    fn auth_failure_statuses() {
        assert!(RemoteError::new("x", 401, "").is_auth_failure());
        assert!(RemoteError::new("x", 403, "").is_auth_failure());
        assert!(!RemoteError::new("x", 404, "").is_auth_failure());
        assert!(!RemoteError::new("x", 500, "").is_auth_failure());
    }

    #[test]
    fn metric_not_found_names_metric() {
        let err = Error::MetricNotFound {
            name: "EndUser/Apdex".to_string(),
        };
        assert!(err.to_string().contains("EndUser/Apdex"));
    }
}
