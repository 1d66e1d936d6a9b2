//! Webhook delivery request and payload types.

use std::collections::HashMap;
use std::time::Duration;

use jiff::Timestamp;
use nlprag_core::{Result, TaskId, TaskResult};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Body posted to a webhook endpoint when a task completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Identity of the completed task.
    pub task_id: TaskId,
    /// The task result, as returned to the submitting caller.
    pub result: serde_json::Value,
    /// When the task completed.
    pub completed_at: Timestamp,
}

impl WebhookPayload {
    /// Builds the payload announcing `result`.
    pub fn from_result(result: &TaskResult) -> Result<Self> {
        Ok(Self {
            task_id: result.task_id.clone(),
            result: serde_json::to_value(&result.result)?,
            completed_at: result.completed_at,
        })
    }
}

/// A webhook delivery request.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Unique identifier for this delivery.
    pub request_id: Uuid,
    /// The webhook endpoint URL.
    pub url: Url,
    /// The body to deliver.
    pub payload: WebhookPayload,
    /// Custom headers to include in the request.
    pub headers: HashMap<String, String>,
    /// Optional request timeout (uses client default if not set).
    pub timeout: Option<Duration>,
}

impl WebhookRequest {
    /// Creates a new webhook request.
    pub fn new(url: Url, payload: WebhookPayload) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            url,
            payload,
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a custom header to the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
