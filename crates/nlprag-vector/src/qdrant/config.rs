//! Qdrant connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::CollectionParams;

/// Default Qdrant gRPC endpoint.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default timeout for Qdrant calls: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Qdrant backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct QdrantConfig {
    /// Qdrant server URL (gRPC port)
    #[cfg_attr(
        feature = "config",
        arg(long = "qdrant-url", env = "QDRANT_URL", default_value = DEFAULT_QDRANT_URL)
    )]
    #[serde(default = "default_url")]
    pub qdrant_url: String,

    /// API key for Qdrant Cloud or secured deployments
    #[cfg_attr(feature = "config", arg(long = "qdrant-api-key", env = "QDRANT_API_KEY"))]
    #[serde(default, skip_serializing)]
    pub qdrant_api_key: Option<String>,

    /// Number of shards for newly created collections
    #[cfg_attr(
        feature = "config",
        arg(long = "qdrant-shard-number", env = "QDRANT_SHARD_NUMBER", default_value_t = 2)
    )]
    #[serde(default = "default_two")]
    pub qdrant_shard_number: u32,

    /// Replication factor for newly created collections
    #[cfg_attr(
        feature = "config",
        arg(
            long = "qdrant-replication-factor",
            env = "QDRANT_REPLICATION_FACTOR",
            default_value_t = 2
        )
    )]
    #[serde(default = "default_two")]
    pub qdrant_replication_factor: u32,

    /// Timeout for Qdrant calls in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "qdrant-timeout", env = "QDRANT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout_secs")]
    pub qdrant_timeout: u64,
}

fn default_url() -> String {
    DEFAULT_QDRANT_URL.to_owned()
}

fn default_two() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_url(),
            qdrant_api_key: None,
            qdrant_shard_number: default_two(),
            qdrant_replication_factor: default_two(),
            qdrant_timeout: default_timeout_secs(),
        }
    }
}

impl QdrantConfig {
    /// Creates a configuration for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.qdrant_api_key = Some(api_key.into());
        self
    }

    /// Returns the call timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.qdrant_timeout)
    }

    /// Returns the collection parameters for vectors of `dimension`.
    pub fn collection_params(&self, dimension: usize) -> CollectionParams {
        CollectionParams {
            dimension,
            shard_number: self.qdrant_shard_number,
            replication_factor: self.qdrant_replication_factor,
        }
    }
}
