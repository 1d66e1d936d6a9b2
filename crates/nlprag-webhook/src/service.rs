//! Webhook service wrapper.

use std::fmt;
use std::sync::Arc;

use nlprag_core::TaskResult;
use url::Url;

use crate::{
    Result, ServiceHealth, TRACING_TARGET, WebhookPayload, WebhookProvider, WebhookRequest,
    WebhookResponse,
};

/// Webhook service with observability.
///
/// Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct WebhookService {
    provider: Arc<dyn WebhookProvider>,
}

impl fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookService").finish_non_exhaustive()
    }
}

impl WebhookService {
    /// Creates a new webhook service from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: WebhookProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a webhook service over a shared provider.
    pub fn from_arc(provider: Arc<dyn WebhookProvider>) -> Self {
        Self { provider }
    }

    /// Delivers a request.
    pub async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        self.provider.deliver(request).await
    }

    /// Performs a health check on the provider.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.provider.health_check().await
    }

    /// Notifies `url` that `result` is complete.
    ///
    /// Never fails and never retries: every problem is logged. Returns the
    /// response when the endpoint answered.
    #[tracing::instrument(skip(self, result), fields(task_id = %result.task_id), target = TRACING_TARGET)]
    pub async fn notify(&self, url: &str, result: &TaskResult) -> Option<WebhookResponse> {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    url = %url,
                    error = %error,
                    "Invalid webhook URL, skipping notification"
                );
                return None;
            }
        };

        let payload = match WebhookPayload::from_result(result) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Failed to build webhook payload"
                );
                return None;
            }
        };

        let request = WebhookRequest::new(url, payload);
        match self.provider.deliver(&request).await {
            Ok(response) if response.is_success() => {
                tracing::info!(
                    target: TRACING_TARGET,
                    url = %request.url,
                    status_code = response.status_code,
                    "Webhook notified"
                );
                Some(response)
            }
            Ok(response) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    url = %request.url,
                    status_code = response.status_code,
                    "Webhook notification rejected"
                );
                Some(response)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    url = %request.url,
                    error = %error,
                    "Webhook notification failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jiff::Timestamp;
    use nlprag_core::{
        ClassifyOutput, Error, InferenceResult, TaskId, TaskKind, TaskOutput,
    };

    use super::*;

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<WebhookRequest>>,
        status: u16,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl WebhookProvider for Recorder {
        async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
            self.delivered.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(Error::upstream().with_message("connection refused"));
            }
            Ok(WebhookResponse::new(
                request.request_id,
                self.status,
                Timestamp::now(),
            ))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::healthy())
        }
    }

    fn result() -> TaskResult {
        TaskResult::single(
            TaskId::generate(),
            TaskKind::Classify,
            InferenceResult::new(
                TaskOutput::Classify(ClassifyOutput {
                    category: "chronic".to_owned(),
                    confidence: 0.7,
                }),
                Vec::new(),
            ),
        )
    }

    #[tokio::test]
    async fn test_notify_delivers_payload() {
        let recorder = Arc::new(Recorder {
            status: 200,
            ..Default::default()
        });
        let service = WebhookService::from_arc(recorder.clone());
        let result = result();

        let response = service.notify("https://example.com/hook", &result).await;
        assert!(response.is_some_and(|r| r.is_success()));

        let delivered = recorder.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].payload.task_id, result.task_id);
        assert_eq!(delivered[0].payload.result["category"], "chronic");
    }

    #[tokio::test]
    async fn test_invalid_url_is_skipped() {
        let recorder = Arc::new(Recorder::default());
        let service = WebhookService::from_arc(recorder.clone());

        assert!(service.notify("not a url", &result()).await.is_none());
        assert!(recorder.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_without_retry() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let service = WebhookService::from_arc(recorder.clone());

        assert!(service.notify("https://example.com/hook", &result()).await.is_none());
        assert_eq!(recorder.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_reported_without_retry() {
        let recorder = Arc::new(Recorder {
            status: 500,
            ..Default::default()
        });
        let service = WebhookService::from_arc(recorder.clone());

        let response = service.notify("https://example.com/hook", &result()).await;
        assert!(response.is_some_and(|r| !r.is_success()));
        assert_eq!(recorder.delivered.lock().unwrap().len(), 1);
    }
}
