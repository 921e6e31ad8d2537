//! Rate feed and refresh job error types.

use thiserror::Error;

/// Errors that can occur while fetching, storing or publishing rates.
#[derive(Debug, Error)]
pub enum RatesError {
    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("Rate provider returned HTTP {0}")]
    HttpStatus(u16),

    /// Provider answered 2xx but reported a failure in the body.
    #[error("Rate provider error: {0}")]
    Provider(String),

    /// Response body is missing required fields.
    #[error("Malformed rate response: {0}")]
    MalformedResponse(String),

    /// Base currency is not in the catalog.
    #[error("Unknown base currency: {0}")]
    UnknownBase(String),

    /// Reading or writing the rate file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding JSON failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RatesError {
    /// Whether the failure is transient and likely to clear by the next run.
    pub fn is_retryable(&self) -> bool {
        match self {
            RatesError::Http(_) | RatesError::Io(_) => true,
            RatesError::HttpStatus(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for rate operations.
pub type RatesResult<T> = Result<T, RatesError>;
