//! Recording webhook provider for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jiff::Timestamp;
use nlprag_core::{Result, ServiceHealth};
use nlprag_webhook::{WebhookProvider, WebhookRequest, WebhookResponse};

/// Webhook provider that records deliveries instead of sending them.
#[derive(Debug, Clone)]
pub struct RecordingWebhook {
    status: u16,
    delivered: Arc<Mutex<Vec<WebhookRequest>>>,
}

impl Default for RecordingWebhook {
    fn default() -> Self {
        Self::with_status(200)
    }
}

impl RecordingWebhook {
    /// Creates a recorder answering 200.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder answering with `status`.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            delivered: Arc::default(),
        }
    }

    /// Returns the deliveries recorded so far.
    pub fn delivered(&self) -> Vec<WebhookRequest> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }

    /// Waits until at least `count` deliveries were recorded or `timeout` passes.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<WebhookRequest> {
        let poll = async {
            loop {
                let delivered = self.delivered();
                if delivered.len() >= count {
                    return delivered;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(delivered) => delivered,
            Err(_) => self.delivered(),
        }
    }
}

#[async_trait::async_trait]
impl WebhookProvider for RecordingWebhook {
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let started_at = Timestamp::now();
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(request.clone());
        }
        Ok(WebhookResponse::new(request.request_id, self.status, started_at))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}
