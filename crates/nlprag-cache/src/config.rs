//! Cache configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default time-to-live of a cached result: one hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default NATS key-value bucket name.
pub const DEFAULT_BUCKET: &str = "nlprag_results";

/// Configuration for the result cache.
///
/// The NATS backend is used when `nats_url` is set, otherwise results are
/// cached in process memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CacheConfig {
    /// NATS server URL for the key-value cache
    #[cfg_attr(feature = "config", arg(long = "nats-url", env = "NATS_URL"))]
    #[serde(default)]
    pub nats_url: Option<String>,

    /// NATS authentication token
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    #[serde(default, skip_serializing)]
    pub nats_token: Option<String>,

    /// Key-value bucket holding cached results
    #[cfg_attr(
        feature = "config",
        arg(long = "cache-bucket", env = "CACHE_BUCKET", default_value = DEFAULT_BUCKET)
    )]
    #[serde(default = "default_bucket")]
    pub cache_bucket: String,

    /// Time-to-live of cached results in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "cache-ttl", env = "CACHE_TTL", default_value_t = DEFAULT_TTL_SECS)
    )]
    #[serde(default = "default_ttl_secs")]
    pub cache_ttl: u64,

    /// Timeout for connecting to NATS in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT", default_value_t = 10)
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub nats_connect_timeout: u64,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_owned()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            nats_url: None,
            nats_token: None,
            cache_bucket: default_bucket(),
            cache_ttl: default_ttl_secs(),
            nats_connect_timeout: default_connect_timeout_secs(),
        }
    }
}

impl CacheConfig {
    /// Sets the NATS server URL.
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    /// Sets the time-to-live in seconds.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl = ttl_secs;
        self
    }

    /// Returns the time-to-live as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Returns the NATS connection timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.nats_connect_timeout)
    }
}
