//! Error types for delivery-status
//!
//! Errors only surface at two places: constructing the configuration and the
//! initial login. Everything below the resolver degrades to an empty result and
//! is logged instead of returned.

use thiserror::Error;

/// Result type alias for delivery-status operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for delivery-status
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is missing or invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "CF_EMAIL")
        key: Option<String>,
    },

    /// Login did not yield a token
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code returned by the server
        status: u16,
        /// URL of the failed request
        url: String,
    },

    /// Malformed response body
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
