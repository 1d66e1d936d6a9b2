//! Internal error types for upstream HTTP calls.

use nlprag_core::Error;
use thiserror::Error;

/// Error raised while talking to an upstream model service.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request failed before a response was received.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Reqwest(e) => {
                if e.is_timeout() {
                    Error::timeout().with_message(e.to_string()).with_source(e)
                } else if e.is_connect() {
                    Error::upstream()
                        .with_message("connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    Error::data_shape().with_message(e.to_string()).with_source(e)
                } else {
                    Error::upstream().with_message(e.to_string()).with_source(e)
                }
            }
            HttpError::Status { status, body } => Error::upstream()
                .with_status(status)
                .with_message(if body.is_empty() {
                    format!("upstream returned status {status}")
                } else {
                    body
                }),
            HttpError::Decode(e) => Error::data_shape().with_message(e.to_string()).with_source(e),
        }
    }
}
