//! Delivery settings for the reqwest sink.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How completion notifications are sent and signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Seconds one delivery attempt may take; 0 falls back to 30.
    #[cfg_attr(
        feature = "config",
        arg(long = "webhook-timeout", env = "WEBHOOK_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub webhook_timeout: u64,

    /// Overrides `nlprag-webhook/<version>` as User-Agent.
    #[cfg_attr(
        feature = "config",
        arg(id = "webhook_user_agent", long = "webhook-user-agent", env = "WEBHOOK_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API key sent as `x-api-key` with every delivery
    #[cfg_attr(
        feature = "config",
        arg(id = "webhook_api_key", long = "webhook-api-key", env = "WEBHOOK_API_KEY")
    )]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Secret used to sign deliveries with HMAC-SHA256
    #[cfg_attr(
        feature = "config",
        arg(id = "webhook_secret", long = "webhook-secret", env = "WEBHOOK_SECRET")
    )]
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            webhook_timeout: default_timeout_secs(),
            user_agent: None,
            api_key: None,
            secret: None,
        }
    }
}

impl ReqwestConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            webhook_timeout: timeout_secs,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        let secs = match self.webhook_timeout {
            0 => DEFAULT_TIMEOUT_SECS,
            secs => secs,
        };
        Duration::from_secs(secs)
    }

    pub fn effective_user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) => agent.clone(),
            None => concat!("nlprag-webhook/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Enables the `X-Webhook-Signature` header.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}
