use nlprag_core::{InferenceRequest, TaskId, TaskKind};
use serde::{Deserialize, Serialize};

/// Body of `POST /nlp/unified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRequest {
    #[serde(flatten)]
    pub request: InferenceRequest,
    /// Queue the request on the worker pool instead of waiting for it.
    #[serde(default)]
    pub background: bool,
}

impl UnifiedRequest {
    /// Wraps a request that runs synchronously.
    pub fn new(request: InferenceRequest) -> Self {
        Self {
            request,
            background: false,
        }
    }

    /// Marks the request for background processing.
    pub fn in_background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// Path parameters of `GET /nlp/tasks/{task_id}/{task}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPathParams {
    pub task_id: TaskId,
    pub task: TaskKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_defaults_to_false() {
        let body: UnifiedRequest =
            serde_json::from_str(r#"{"text":"Persistent cough","task":"classify"}"#).unwrap();
        assert!(!body.background);
        assert_eq!(body.request.task, TaskKind::Classify);
        assert_eq!(body.request.categories, ["infectious", "chronic", "other"]);
    }

    #[test]
    fn flattened_fields() {
        let body: UnifiedRequest = serde_json::from_str(
            r#"{"task":"sentiment","batch":["a","b"],"webhook_url":"https://example.com/hook","background":true}"#,
        )
        .unwrap();
        assert!(body.background);
        assert!(body.request.is_batch());
        assert_eq!(
            body.request.webhook_url.as_deref(),
            Some("https://example.com/hook")
        );
    }
}
