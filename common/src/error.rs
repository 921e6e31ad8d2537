//! Error types shared across the converter crates.

use thiserror::Error;

/// Errors raised by the shared currency and amount types.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Currency code is not in the catalog.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Amount text is not a non-negative decimal number.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Exchange rate is zero or negative.
    #[error("Invalid rate {rate} for {code}")]
    InvalidRate { code: String, rate: String },
}

/// Result type for shared operations.
pub type CommonResult<T> = Result<T, CommonError>;
