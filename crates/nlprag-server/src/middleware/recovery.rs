//! Recovery from panics and slow requests.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::ErrorKind;

const TRACING_TARGET: &str = "nlprag_server::middleware::recovery";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Deadline applied to every HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Maximum duration in seconds to wait for a request before answering 504.
    ///
    /// A timed-out synchronous request keeps running and is still cached.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)
    )]
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl RecoveryConfig {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            request_timeout: secs,
        }
    }

    /// Returns the deadline; zero is raised to one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}

/// Turns handler panics into 500 and overdue requests into 504.
pub trait RouterRecoveryExt<S> {
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        self.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(answer_layer_error))
                .layer(CatchPanicLayer::custom(answer_panic))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
    }
}

async fn answer_layer_error(err: tower::BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!(target: TRACING_TARGET, "Request deadline passed, answering 504");
        // Synchronous pipeline runs are detached and still complete.
        return ErrorKind::GatewayTimeout
            .with_context("Processing continues; the result can be read back once cached")
            .into_response();
    }

    tracing::error!(target: TRACING_TARGET, error = %err, "Middleware failed");
    ErrorKind::InternalServerError
        .with_context(err.to_string())
        .into_response()
}

fn answer_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let reason = match (payload.downcast_ref::<String>(), payload.downcast_ref::<&str>()) {
        (Some(reason), _) => reason.as_str(),
        (None, Some(reason)) => *reason,
        (None, None) => "non-string panic payload",
    };
    tracing::error!(target: TRACING_TARGET, reason, "Handler panicked");

    ErrorKind::InternalServerError.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    }

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn slow_request_times_out() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/slow", get(slow))
            .with_recovery(&RecoveryConfig::with_timeout_secs(1));
        let server = TestServer::new(app)?;

        let response = server.get("/slow").await;
        response.assert_status(StatusCode::GATEWAY_TIMEOUT);
        Ok(())
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/boom", get(boom))
            .with_recovery(&RecoveryConfig::default());
        let server = TestServer::new(app)?;

        let response = server.get("/boom").await;
        response.assert_status_internal_server_error();
        Ok(())
    }
}
