//! Notification delivery over reqwest.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use reqwest::{Client, RequestBuilder};
use sha2::Sha256;

use super::{Error, ReqwestConfig, TRACING_TARGET};
use crate::{ServiceHealth, WebhookProvider, WebhookRequest, WebhookResponse, WebhookService};

/// Delivers [`WebhookRequest`]s as signed JSON POSTs.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    http: Client,
    config: Arc<ReqwestConfig>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("timeout", &self.config.timeout())
            .field("signed", &self.config.secret.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    pub fn new(config: ReqwestConfig) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(|e| {
                crate::Error::configuration()
                    .with_message("webhook HTTP client cannot be built")
                    .with_source(e)
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = config.timeout().as_millis(),
            signed = config.secret.is_some(),
            "Webhook client ready"
        );

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn into_service(self) -> WebhookService {
        WebhookService::new(self)
    }

    /// Returns the hex HMAC-SHA256 of `{timestamp}.{payload}` under `secret`.
    pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> crate::Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|e| {
            crate::Error::configuration().with_message(format!("unusable WEBHOOK_SECRET: {e}"))
        })?;
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Adds the credential and signature headers the configuration asks for.
    fn authenticate(
        &self,
        builder: RequestBuilder,
        timestamp: i64,
        body: &[u8],
    ) -> crate::Result<RequestBuilder> {
        let builder = match &self.config.api_key {
            Some(api_key) => builder.header("x-api-key", api_key),
            None => builder,
        };

        Ok(match &self.config.secret {
            Some(secret) => {
                let signature = Self::sign_payload(secret, timestamp, body)?;
                builder.header("X-Webhook-Signature", format!("sha256={signature}"))
            }
            None => builder,
        })
    }
}

#[async_trait::async_trait]
impl WebhookProvider for ReqwestClient {
    async fn deliver(&self, request: &WebhookRequest) -> crate::Result<WebhookResponse> {
        let sent_at = Timestamp::now();
        let timestamp = sent_at.as_second();
        let body = serde_json::to_vec(&request.payload).map_err(Error::Serde)?;

        let builder = self
            .http
            .post(request.url.as_str())
            .timeout(request.timeout.unwrap_or_else(|| self.config.timeout()))
            .header("Content-Type", "application/json")
            .header("X-Webhook-Timestamp", timestamp.to_string())
            .header("X-Webhook-Request-Id", request.request_id.to_string());
        let builder = request
            .headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        let builder = self.authenticate(builder, timestamp, &body)?;

        let status = builder
            .body(body)
            .send()
            .await
            .map_err(Error::from)?
            .status();

        let response = WebhookResponse::new(request.request_id, status.as_u16(), sent_at);
        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            task_id = %request.payload.task_id,
            status = status.as_u16(),
            elapsed_ms = response.elapsed.as_millis(),
            "Webhook answered"
        );

        Ok(response)
    }

    async fn health_check(&self) -> crate::Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

#[cfg(test)]
mod tests {
    use nlprag_core::{
        InferenceResult, SentimentOutput, TaskId, TaskKind, TaskOutput, TaskResult,
    };
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ServiceStatus;

    fn result() -> TaskResult {
        TaskResult::single(
            TaskId::generate(),
            TaskKind::Sentiment,
            InferenceResult::new(
                TaskOutput::Sentiment(SentimentOutput {
                    sentiment: "positive".to_owned(),
                    score: 0.8,
                }),
                Vec::new(),
            ),
        )
    }

    #[test]
    fn test_sign_payload() {
        let signature = ReqwestClient::sign_payload("test_secret", 1234567890, b"{}").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        let again = ReqwestClient::sign_payload("test_secret", 1234567890, b"{}").unwrap();
        assert_eq!(signature, again);
        let other = ReqwestClient::sign_payload("other", 1234567890, b"{}").unwrap();
        assert_ne!(signature, other);
    }

    #[tokio::test]
    async fn test_delivers_signed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("x-api-key", "hook-key"))
            .and(header("Content-Type", "application/json"))
            .and(header_exists("X-Webhook-Timestamp"))
            .and(header_exists("X-Webhook-Request-Id"))
            .and(header_exists("X-Webhook-Signature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestClient::new(
            ReqwestConfig::default()
                .with_api_key("hook-key")
                .with_secret("shh"),
        )
        .unwrap();
        let service = client.into_service();
        let result = result();

        let response = service
            .notify(&format!("{}/hook", server.uri()), &result)
            .await
            .unwrap();
        assert!(response.is_success());

        let received = server.received_requests().await.unwrap();
        let request = &received[0];

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["task_id"], result.task_id.as_str());
        assert_eq!(body["result"]["sentiment"], "positive");
        assert!(body.get("completed_at").is_some());

        let timestamp: i64 = request.headers["X-Webhook-Timestamp"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let expected = ReqwestClient::sign_payload("shh", timestamp, &request.body).unwrap();
        assert_eq!(
            request.headers["X-Webhook-Signature"].to_str().unwrap(),
            format!("sha256={expected}")
        );
    }

    #[tokio::test]
    async fn test_unsigned_delivery_and_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let service = ReqwestClient::new(ReqwestConfig::default())
            .unwrap()
            .into_service();

        let response = service.notify(&server.uri(), &result()).await.unwrap();
        assert_eq!(response.status_code, 500);

        let received = server.received_requests().await.unwrap();
        assert!(!received[0].headers.contains_key("X-Webhook-Signature"));
        assert!(!received[0].headers.contains_key("x-api-key"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let client = ReqwestClient::new(ReqwestConfig::default()).unwrap();
        let health = client.health_check().await.unwrap();
        assert_eq!(health.status, ServiceStatus::Healthy);
    }
}
