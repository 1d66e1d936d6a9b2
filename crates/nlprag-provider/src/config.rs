//! Upstream service configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default base URL of the chat completion service.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.us.inc/usf/v1/hiring";

/// Default base URL of the embedding and reranking services.
pub const DEFAULT_EMBED_BASE_URL: &str = "https://api.us.inc/usf/v1/embed";

/// Default timeout for upstream requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration shared by the inference, embedding and reranking clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProviderConfig {
    /// API key sent as `x-api-key` on every upstream request
    #[cfg_attr(feature = "config", arg(long = "api-key", env = "API_KEY"))]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the chat completion service
    #[cfg_attr(
        feature = "config",
        arg(long = "chat-base-url", env = "CHAT_BASE_URL", default_value = DEFAULT_CHAT_BASE_URL)
    )]
    #[serde(default = "default_chat_base_url")]
    pub chat_base_url: String,

    /// Base URL of the embedding service
    #[cfg_attr(
        feature = "config",
        arg(long = "embed-base-url", env = "EMBED_BASE_URL", default_value = DEFAULT_EMBED_BASE_URL)
    )]
    #[serde(default = "default_embed_base_url")]
    pub embed_base_url: String,

    /// Base URL of the reranking service
    #[cfg_attr(
        feature = "config",
        arg(long = "rerank-base-url", env = "RERANK_BASE_URL", default_value = DEFAULT_EMBED_BASE_URL)
    )]
    #[serde(default = "default_embed_base_url")]
    pub rerank_base_url: String,

    /// Chat completion model
    #[cfg_attr(
        feature = "config",
        arg(long = "chat-model", env = "CHAT_MODEL", default_value = "usf1-mini")
    )]
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model
    #[cfg_attr(
        feature = "config",
        arg(long = "embed-model", env = "EMBED_MODEL", default_value = "usf1-embed")
    )]
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Reranking model
    #[cfg_attr(
        feature = "config",
        arg(long = "rerank-model", env = "RERANK_MODEL", default_value = "usf1-rerank")
    )]
    #[serde(default = "default_rerank_model")]
    pub rerank_model: String,

    /// Upstream request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,
}

fn default_chat_base_url() -> String {
    DEFAULT_CHAT_BASE_URL.to_owned()
}

fn default_embed_base_url() -> String {
    DEFAULT_EMBED_BASE_URL.to_owned()
}

fn default_chat_model() -> String {
    "usf1-mini".to_owned()
}

fn default_embed_model() -> String {
    "usf1-embed".to_owned()
}

fn default_rerank_model() -> String {
    "usf1-rerank".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            chat_base_url: default_chat_base_url(),
            embed_base_url: default_embed_base_url(),
            rerank_base_url: default_embed_base_url(),
            chat_model: default_chat_model(),
            embed_model: default_embed_model(),
            rerank_model: default_rerank_model(),
            http_timeout: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Points every service at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.chat_base_url = base_url.clone();
        self.embed_base_url = base_url.clone();
        self.rerank_base_url = base_url;
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Returns the effective timeout, using the default when zero.
    pub fn timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.chat_model, "usf1-mini");
        assert_eq!(config.embed_model, "usf1-embed");
        assert_eq!(config.rerank_model, "usf1-rerank");
        assert_eq!(config.rerank_base_url, DEFAULT_EMBED_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = ProviderConfig::default().with_timeout(0);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = ProviderConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
