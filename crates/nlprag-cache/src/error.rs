//! Cache error types.

use std::time::Duration;

use nlprag_core::Error;

/// Result type for cache operations.
pub type CacheResult<T, E = CacheError> = std::result::Result<T, E>;

/// Error raised by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// A backend operation failed.
    #[error("cache {operation} failed: {reason}")]
    Operation {
        operation: &'static str,
        reason: String,
    },

    /// A value could not be encoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend did not answer in time.
    #[error("cache operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl CacheError {
    /// Creates a connection error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection(reason.into())
    }

    /// Creates an operation error.
    pub fn operation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            reason: reason.into(),
        }
    }
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        match &err {
            CacheError::Serialization(_) => Error::serialization(),
            CacheError::Timeout { .. } => Error::timeout(),
            CacheError::Connection(_) | CacheError::Operation { .. } => Error::upstream(),
        }
        .with_message(err.to_string())
        .with_source(err)
    }
}
