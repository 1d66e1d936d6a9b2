//! Failures of a single delivery attempt.

use nlprag_core::Error as CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("delivery failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("payload could not be encoded: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<Error> for CoreError {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) if e.is_timeout() => CoreError::timeout()
                .with_message("webhook endpoint did not answer in time")
                .with_source(e),
            Error::Reqwest(e) if e.is_connect() => CoreError::upstream()
                .with_message("webhook endpoint unreachable")
                .with_source(e),
            Error::Reqwest(e) => CoreError::upstream()
                .with_message(e.to_string())
                .with_source(e),
            Error::Serde(e) => CoreError::serialization()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
