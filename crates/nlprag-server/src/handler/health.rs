//! Service health endpoint.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use jiff::Timestamp;
use nlprag_core::ServiceStatus;

use crate::extract::Json;
use crate::handler::response::{CollectionSize, Health};
use crate::service::ServiceState;

/// Tracing target for health checks.
const TRACING_TARGET: &str = "nlprag_server::handler::health";

/// Reports service status, version and the size of each task collection.
///
/// The service is degraded when the vector store cannot be read or the
/// worker pool no longer accepts jobs.
async fn health(State(state): State<ServiceState>) -> Json<Health> {
    let accepting_jobs = state.jobs().is_accepting();
    let collections = state.pipeline().context().collections();

    let (status, collections, message) = match collections.report().await {
        Ok(report) => {
            let sizes = report
                .into_iter()
                .map(|entry| CollectionSize {
                    collection: entry.kind.collection_name().to_owned(),
                    points: entry.points,
                })
                .collect();
            (ServiceStatus::Healthy, sizes, None)
        }
        Err(err) => {
            tracing::warn!(target: TRACING_TARGET, error = %err, "Vector store unavailable");
            (ServiceStatus::Degraded, Vec::new(), Some(err.to_string()))
        }
    };

    let status = if accepting_jobs {
        status
    } else {
        status.worst(ServiceStatus::Degraded)
    };

    Json(Health {
        status,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        accepting_jobs,
        collections,
        message,
        checked_at: Timestamp::now(),
    })
}

/// Returns a [`Router`] with the health route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::handler::test::create_test_app;

    #[tokio::test(flavor = "multi_thread")]
    async fn healthy_service() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app.server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["accepting_jobs"], true);
        assert_eq!(body["collections"].as_array().map(Vec::len), Some(4));

        app.workers.shutdown().await?;
        Ok(())
    }
}
