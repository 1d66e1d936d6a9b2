//! HTTP error returned by every handler.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// Handler failure rendered as an [`ErrorResponse`].
///
/// The kind fixes the status and default message; `message` overrides the
/// default and `context` carries the details of this occurrence.
#[derive(Debug, Clone, Default)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    context: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    fn into_body(self) -> ErrorResponse {
        let body = self.kind.response();
        let body = match self.message {
            Some(message) => body.with_message(message),
            None => body,
        };
        match self.context {
            Some(context) => body.with_context(context),
            None => body,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.clone().into_body();
        write!(f, "{} {}: {}", body.status.as_u16(), body.name, body.message)?;
        match &body.context {
            Some(context) => write!(f, " ({context})"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_body().into_response()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result of an HTTP handler.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The statuses this service answers errors with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unusable body or path.
    BadRequest,
    /// Unknown route, or no cached result under that identity.
    NotFound,
    /// The inference oracle failed or answered garbage.
    BadGateway,
    /// An upstream call or the whole request ran out of time.
    GatewayTimeout,
    #[default]
    InternalServerError,
}

impl ErrorKind {
    pub fn with_message(self, message: impl Into<String>) -> Error {
        Error::new(self).with_message(message)
    }

    pub fn with_context(self, context: impl Into<String>) -> Error {
        Error::new(self).with_context(context)
    }

    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the body sent when nothing more specific is known.
    pub fn response(self) -> ErrorResponse {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::BadGateway => ErrorResponse::BAD_GATEWAY,
            Self::GatewayTimeout => ErrorResponse::GATEWAY_TIMEOUT,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}
