//! The error shared by every pipeline component.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with the workspace error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// An external service call failed at the transport or status level.
    UpstreamService,
    /// A response did not match the expected structured schema.
    DataShape,
    /// A required resource (a vector collection) could not be initialized.
    ResourceInit,
    /// Required credentials or endpoints are missing or invalid.
    Configuration,
    /// The caller supplied an unusable request.
    InvalidInput,
    /// A value could not be (de)serialized.
    Serialization,
    /// An external call exceeded its deadline.
    Timeout,
    /// The requested record does not exist.
    NotFound,
    /// Unexpected internal failure.
    Internal,
}

/// A structured error shared by all pipeline components.
#[derive(Debug, Error)]
#[error("{}{}{}",
    kind.as_ref(),
    status.map(|s| format!(" ({s})")).unwrap_or_default(),
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
)]
pub struct Error {
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: Option<String>,
    /// Upstream status code, when the failure came from an HTTP response.
    pub status: Option<u16>,
    #[source]
    pub source: Option<BoxedError>,
}

/// Generates one shorthand constructor per kind.
macro_rules! kind_constructors {
    ($($name:ident => $kind:ident),+ $(,)?) => {
        impl Error {
            $(
                #[doc = concat!("An error of kind [`ErrorKind::", stringify!($kind), "`].")]
                pub fn $name() -> Self {
                    Self::new(ErrorKind::$kind)
                }
            )+
        }
    };
}

kind_constructors! {
    upstream => UpstreamService,
    data_shape => DataShape,
    resource_init => ResourceInit,
    configuration => Configuration,
    invalid_input => InvalidInput,
    serialization => Serialization,
    timeout => Timeout,
    not_found => NotFound,
    internal => Internal,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            source: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attaches the upstream status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the snake_case name of the kind, as used in logs and HTTP bodies.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the upstream status code, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns whether the operation may succeed when attempted again.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Timeout => true,
            ErrorKind::UpstreamService => self.status.is_none_or(|s| s == 429 || s >= 500),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_status_and_message() {
        let err = Error::upstream()
            .with_status(503)
            .with_message("embedding service unavailable");

        assert_eq!(
            err.to_string(),
            "upstream_service (503): embedding service unavailable"
        );
    }

    #[test]
    fn test_kind_str() {
        assert_eq!(Error::data_shape().kind_str(), "data_shape");
        assert_eq!(Error::resource_init().kind_str(), "resource_init");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::timeout().is_retryable());
        assert!(Error::upstream().is_retryable());
        assert!(Error::upstream().with_status(502).is_retryable());
        assert!(!Error::upstream().with_status(401).is_retryable());
        assert!(!Error::data_shape().is_retryable());
        assert!(!Error::configuration().is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(std::error::Error::source(&err).is_some());
    }
}
