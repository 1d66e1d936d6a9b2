//! Cached result lookup.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use nlprag_core::TaskResult;
use nlprag_pipeline::Pipeline;

use crate::extract::{Json, Path};
use crate::handler::request::TaskPathParams;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for result lookups.
const TRACING_TARGET: &str = "nlprag_server::handler::tasks";

/// Returns the cached result of an earlier submission.
///
/// Results expire with the cache TTL, after which this answers 404.
#[tracing::instrument(skip_all, fields(task_id = %params.task_id, task = %params.task))]
async fn read_task(
    State(pipeline): State<Pipeline>,
    Path(params): Path<TaskPathParams>,
) -> Result<Json<TaskResult>> {
    let Some(result) = pipeline.lookup(&params.task_id, params.task).await? else {
        tracing::debug!(target: TRACING_TARGET, "No cached result");
        return Err(ErrorKind::NotFound
            .with_message("No result for this task")
            .with_context("The task is still running, has expired, or never existed"));
    };

    Ok(Json(result))
}

/// Returns a [`Router`] with the lookup route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/nlp/tasks/{task_id}/{task}", get(read_task))
}

#[cfg(test)]
mod tests {
    use nlprag_core::TaskResult;
    use serde_json::json;

    use crate::handler::test::create_test_app;

    #[tokio::test(flavor = "multi_thread")]
    async fn re_read_of_synchronous_result() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let created: TaskResult = app
            .server
            .post("/nlp/unified")
            .json(&json!({"text": "Chest pain at night", "task": "sentiment"}))
            .await
            .json();

        let path = format!("/nlp/tasks/{}/sentiment", created.task_id);
        let read: TaskResult = app.server.get(&path).await.json();
        assert_eq!(read, created);

        let path = format!("/nlp/tasks/{}/classify", created.task_id);
        app.server.get(&path).await.assert_status_not_found();

        app.workers.shutdown().await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_or_malformed_task() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        app.server
            .get("/nlp/tasks/task_20240101000000_deadbeef/summarize")
            .await
            .assert_status_not_found();

        app.server
            .get("/nlp/tasks/not-a-task/summarize")
            .await
            .assert_status_bad_request();

        app.server
            .get("/nlp/tasks/task_20240101000000_deadbeef/translate")
            .await
            .assert_status_bad_request();

        app.workers.shutdown().await?;
        Ok(())
    }
}
