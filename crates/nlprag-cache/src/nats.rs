//! NATS JetStream key-value cache backend.

use std::time::Duration;

use async_nats::jetstream::kv;
use async_nats::{ConnectOptions, jetstream};
use async_trait::async_trait;

use crate::{CacheBackend, CacheConfig, CacheError, CacheResult, TRACING_TARGET};

/// Client connection name reported to the NATS server.
const CLIENT_NAME: &str = "nlprag";

/// Cache backend over a JetStream key-value bucket.
///
/// The bucket's `max_age` is the expiry of every entry, so all entries share
/// the TTL the bucket was created with.
#[derive(Clone)]
pub struct NatsCache {
    store: kv::Store,
    bucket: String,
    ttl: Duration,
}

impl std::fmt::Debug for NatsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsCache")
            .field("bucket", &self.bucket)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl NatsCache {
    /// Connects to the NATS server named in the configuration and opens the bucket.
    #[tracing::instrument(skip(config), target = TRACING_TARGET)]
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let url = config
            .nats_url
            .as_deref()
            .ok_or_else(|| CacheError::connection("NATS_URL is not set"))?;

        tracing::info!(target: TRACING_TARGET, url = %url, "Connecting to NATS");

        let mut options = ConnectOptions::new().name(CLIENT_NAME);
        if let Some(token) = &config.nats_token {
            options = options.token(token.clone());
        }

        let timeout = config.connect_timeout();
        let client = tokio::time::timeout(timeout, async_nats::connect_with_options(url, options))
            .await
            .map_err(|_| CacheError::Timeout { timeout })?
            .map_err(|e| CacheError::connection(e.to_string()))?;

        let jetstream = jetstream::new(client);
        Self::open(&jetstream, &config.cache_bucket, config.ttl()).await
    }

    /// Opens the bucket, creating it with `max_age = ttl` when missing.
    pub async fn open(
        jetstream: &jetstream::Context,
        bucket: &str,
        ttl: Duration,
    ) -> CacheResult<Self> {
        let store = match jetstream.get_key_value(bucket).await {
            Ok(store) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    bucket = %bucket,
                    "Using existing KV bucket"
                );
                store
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    bucket = %bucket,
                    ttl_secs = ttl.as_secs(),
                    "Creating KV bucket"
                );
                jetstream
                    .create_key_value(kv::Config {
                        bucket: bucket.to_owned(),
                        description: "Cached nlprag task results".to_owned(),
                        max_age: ttl,
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| CacheError::operation("kv_create", e.to_string()))?
            }
        };

        Ok(Self {
            store,
            bucket: bucket.to_owned(),
            ttl,
        })
    }
}

#[async_trait]
impl CacheBackend for NatsCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value = self
            .store
            .get(key)
            .await
            .map_err(|e| CacheError::operation("kv_get", e.to_string()))?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        if ttl != self.ttl {
            tracing::debug!(
                target: TRACING_TARGET,
                bucket = %self.bucket,
                requested_secs = ttl.as_secs(),
                bucket_secs = self.ttl.as_secs(),
                "Per-entry TTL differs from bucket max_age, bucket TTL applies"
            );
        }

        let size = value.len();
        let revision = self
            .store
            .put(key, value.into())
            .await
            .map_err(|e| CacheError::operation("kv_put", e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            revision,
            size_bytes = size,
            "Put value to KV bucket"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}
