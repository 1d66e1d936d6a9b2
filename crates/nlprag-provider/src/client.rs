//! Shared HTTP client for the upstream model services.

use std::sync::Arc;

use nlprag_core::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{HttpError, ProviderConfig, TRACING_TARGET_CLIENT};

struct HttpClientInner {
    http: Client,
    api_key: String,
    config: ProviderConfig,
}

/// Authenticated JSON client shared by the inference, embedding and reranking clients.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("chat_base_url", &self.inner.config.chat_base_url)
            .field("embed_base_url", &self.inner.config.embed_base_url)
            .field("rerank_base_url", &self.inner.config.rerank_base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client from the configuration.
    ///
    /// Fails with a configuration error when no API key is set.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration().with_message("API_KEY is required for upstream services")
            })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("nlprag/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(e)
            })?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            timeout_ms = config.timeout().as_millis(),
            "Created upstream HTTP client"
        );

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                http,
                api_key,
                config,
            }),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    /// Posts `body` as JSON to `{base_url}/{path}` and decodes the JSON response.
    pub(crate) async fn post_json<B, R>(&self, base_url: &str, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), path);

        let response = self
            .inner
            .http
            .post(&url)
            .header("x-api-key", &self.inner.api_key)
            .json(body)
            .send()
            .await
            .map_err(HttpError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                target: TRACING_TARGET_CLIENT,
                url = %url,
                status = status.as_u16(),
                body = %body,
                "Upstream request failed"
            );
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(HttpError::from)?;
        let decoded = serde_json::from_slice(&bytes).map_err(HttpError::from)?;
        Ok(decoded)
    }
}
