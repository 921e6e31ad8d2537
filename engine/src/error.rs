//! Conversion engine error types.

use thiserror::Error;

/// Errors surfaced by the engine service and the favorites stores.
///
/// Invalid input and missing rates are not errors: the engine drops or
/// defers those silently.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine task has stopped and no longer accepts events.
    #[error("Conversion engine stopped")]
    Stopped,

    /// Reading or writing the favorites file failed.
    #[error("Favorites store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Favorites file could not be encoded or decoded.
    #[error("Favorites store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why an amount could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The snapshot has no rate for this code yet.
    #[error("No rate for {0}")]
    MissingRate(String),

    /// The result does not fit in a `Decimal`.
    #[error("Conversion overflowed")]
    Overflow,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
