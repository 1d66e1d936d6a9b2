//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod health;
pub mod request;
pub mod response;
mod tasks;
mod unified;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns the [`Router`] with every route of the service.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .merge(unified::routes())
        .merge(tasks::routes())
        .merge(health::routes())
        .fallback(fallback)
        .with_state(state)
}
