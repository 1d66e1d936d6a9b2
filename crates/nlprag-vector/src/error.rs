//! Failures reported by vector backends.

use nlprag_core::Error;
use thiserror::Error;

pub type VectorResult<T> = Result<T, VectorError>;

#[derive(Debug, Error)]
pub enum VectorError {
    /// The store could not be reached or refused the call.
    #[error("vector store unreachable: {0}")]
    Connection(String),

    #[error("no collection named `{0}`")]
    CollectionNotFound(String),

    /// A create call lost the race against another initializer.
    #[error("collection `{0}` already exists")]
    AlreadyExists(String),

    #[error("vector has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The store answered with something the adapter cannot use.
    #[error("vector store rejected the call: {0}")]
    Backend(String),
}

impl VectorError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound(name.into())
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists(name.into())
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

impl From<VectorError> for Error {
    fn from(err: VectorError) -> Self {
        let error = match &err {
            // A wrong width means the embedding model and collections disagree.
            VectorError::DimensionMismatch { .. } => Error::data_shape(),
            VectorError::CollectionNotFound(_) => Error::not_found(),
            VectorError::Connection(_) | VectorError::AlreadyExists(_) | VectorError::Backend(_) => {
                Error::upstream()
            }
        };

        error.with_message(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use nlprag_core::ErrorKind;

    use super::*;

    #[test]
    fn test_dimension_mismatch_is_data_shape() {
        let err: Error = VectorError::dimension_mismatch(1024, 768).into();
        assert_eq!(err.kind(), ErrorKind::DataShape);
        assert!(err.to_string().contains("768 dimensions, collection expects 1024"));
    }

    #[test]
    fn test_backend_failure_is_upstream() {
        let err: Error = VectorError::backend("unavailable").into();
        assert_eq!(err.kind(), ErrorKind::UpstreamService);

        let err: Error = VectorError::collection_not_found("classify").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
