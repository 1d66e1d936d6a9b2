//! Unified submission endpoint.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use nlprag_core::{InferenceRequest, TaskId};
use nlprag_pipeline::{ExecutionMode, JobQueue, Pipeline};

use crate::extract::Json;
use crate::handler::request::UnifiedRequest;
use crate::handler::response::AcceptedTask;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for submission handlers.
const TRACING_TARGET: &str = "nlprag_server::handler::unified";

/// Runs a request in batch, background or synchronous mode.
///
/// A batch request always runs synchronously, whatever `background` says.
#[tracing::instrument(
    skip_all,
    fields(
        task = %body.request.task,
        batch = body.request.is_batch(),
        background = body.background,
    )
)]
async fn submit(
    State(pipeline): State<Pipeline>,
    State(jobs): State<JobQueue>,
    Json(body): Json<UnifiedRequest>,
) -> Result<Response> {
    let UnifiedRequest {
        request,
        background,
    } = body;

    if background && !request.is_batch() {
        let task = request.task;
        let task_id = jobs.submit(request)?;

        tracing::info!(
            target: TRACING_TARGET,
            task_id = %task_id,
            "Accepted background request"
        );

        let accepted = AcceptedTask::new(task_id, task);
        return Ok((StatusCode::ACCEPTED, Json(accepted)).into_response());
    }

    let result = run_detached(pipeline, request).await?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Runs the pipeline on its own task so a client disconnect cannot cancel
/// it halfway through indexing.
async fn run_detached(
    pipeline: Pipeline,
    request: InferenceRequest,
) -> Result<nlprag_core::TaskResult> {
    request.validate()?;

    let task_id = TaskId::generate();
    tracing::debug!(target: TRACING_TARGET, task_id = %task_id, "Running request");

    let handle = tokio::spawn(async move {
        pipeline
            .run(task_id, &request, ExecutionMode::Synchronous)
            .await
    });

    let result = handle.await.map_err(|err| {
        tracing::error!(target: TRACING_TARGET, error = %err, "Pipeline task panicked");
        ErrorKind::InternalServerError.with_context(err.to_string())
    })??;

    Ok(result)
}

/// Returns a [`Router`] with the submission route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/nlp/unified", post(submit))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nlprag_core::{TaskKind, TaskResult};
    use serde_json::{Value, json};

    use crate::handler::response::AcceptedTask;
    use crate::handler::test::create_test_app;

    #[tokio::test(flavor = "multi_thread")]
    async fn synchronous_classify() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({"text": "Patient has a persistent fever", "task": "classify"}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["task"], "classify");
        assert!(body["task_id"].as_str().is_some_and(|id| id.starts_with("task_")));
        assert!(body["result"]["category"].is_string());
        assert!(body["result"]["confidence"].is_number());
        assert_eq!(body["result"]["related_docs"], json!([]));
        assert!(body["completed_at"].is_string());

        let result: TaskResult = response.json();
        let cached = app.pipeline.lookup(&result.task_id, TaskKind::Classify).await?;
        assert_eq!(cached, Some(result));

        app.workers.shutdown().await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batch_with_partial_failure() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        app.mocks.inference_mock.fail_when("unlucky");

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({
                "task": "sentiment",
                "batch": ["great outcome", "unlucky patient"],
                "background": true,
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let results = &body["result"]["batch_results"];
        assert!(results["great outcome"]["sentiment"].is_string());
        assert!(results["unlucky patient"]["error"].is_string());
        assert!(body.get("related_docs").is_none_or(Value::is_null));

        app.workers.shutdown().await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn background_request_is_accepted_then_cached() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({
                "text": "Long clinical note",
                "task": "summarize",
                "background": true,
                "webhook_url": "https://example.com/hook",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::ACCEPTED);

        let accepted: AcceptedTask = response.json();
        assert_eq!(accepted.task, TaskKind::Summarize);
        assert_eq!(accepted.status, "accepted");

        let delivered = app.webhook.wait_for(1, Duration::from_secs(5)).await;
        assert_eq!(delivered[0].payload.task_id, accepted.task_id);

        let path = format!("/nlp/tasks/{}/summarize", accepted.task_id);
        let response = app.server.get(&path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["result"]["summary"].is_string());

        app.workers.shutdown().await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_requests_are_rejected() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({"text": "", "task": "classify"}))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["name"], "bad_request");

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({"text": "fever", "task": "translate"}))
            .await;
        response.assert_status_bad_request();

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({"task": "classify", "batch": []}))
            .await;
        response.assert_status_bad_request();

        assert_eq!(app.mocks.inference_mock.calls(), 0);
        app.workers.shutdown().await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upstream_failure_is_bad_gateway() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        app.mocks.inference_mock.fail_when("outage");

        let response = app
            .server
            .post("/nlp/unified")
            .json(&json!({"text": "outage during triage", "task": "extract_entities"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);

        let body: Value = response.json();
        assert_eq!(body["name"], "bad_gateway");

        app.workers.shutdown().await?;
        Ok(())
    }
}
