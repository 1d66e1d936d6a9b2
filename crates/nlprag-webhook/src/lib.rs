#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod service;

pub mod request;
pub mod response;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use nlprag_core::{Error, ErrorKind, Result, ServiceHealth, ServiceStatus};
pub use request::{WebhookPayload, WebhookRequest};
pub use response::WebhookResponse;
pub use service::WebhookService;

pub const TRACING_TARGET: &str = "nlprag_webhook";

/// Sends a prepared [`WebhookRequest`] to its endpoint.
#[async_trait::async_trait]
pub trait WebhookProvider: Send + Sync {
    /// Makes one delivery attempt.
    ///
    /// Any HTTP answer, including a rejection, is `Ok`; check
    /// [`WebhookResponse::is_success`].
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse>;

    async fn health_check(&self) -> Result<ServiceHealth>;
}
