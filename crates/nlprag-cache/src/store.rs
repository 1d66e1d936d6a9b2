//! Typed cache over a byte-oriented backend.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{CacheBackend, CacheConfig, CacheResult, MemoryCache, TRACING_TARGET};

/// Typed cache storing values of `T` as JSON with a fixed TTL.
pub struct ResultCache<T> {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResultCache<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            ttl: self.ttl,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ResultCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("backend", &self.backend.name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<T> ResultCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a cache over `backend` whose entries expire after `ttl`.
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            _marker: PhantomData,
        }
    }

    /// Creates an in-memory cache.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new()), ttl)
    }

    /// Opens the backend selected by the configuration.
    ///
    /// NATS is used when a URL is configured, memory otherwise.
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let Some(url) = config.nats_url.as_deref() else {
            tracing::info!(
                target: TRACING_TARGET,
                ttl_secs = config.cache_ttl,
                "Using in-memory result cache"
            );
            return Ok(Self::in_memory(config.ttl()));
        };

        #[cfg(feature = "nats")]
        {
            let backend = crate::nats::NatsCache::connect(config).await?;
            tracing::info!(
                target: TRACING_TARGET,
                url = %url,
                bucket = %config.cache_bucket,
                ttl_secs = config.cache_ttl,
                "Using NATS result cache"
            );
            Ok(Self::new(Arc::new(backend), config.ttl()))
        }

        #[cfg(not(feature = "nats"))]
        {
            Err(crate::CacheError::connection(format!(
                "NATS cache at {url} requested but the `nats` feature is disabled"
            )))
        }
    }

    /// Returns the entry time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns the value under `key`.
    ///
    /// An entry that fails to decode is logged and reported as a miss.
    #[tracing::instrument(skip(self), target = TRACING_TARGET)]
    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let Some(bytes) = self.backend.get(key).await? else {
            tracing::debug!(target: TRACING_TARGET, key = %key, cache_hit = false, "Cache miss");
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(target: TRACING_TARGET, key = %key, cache_hit = true, "Cache hit");
                Ok(Some(value))
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    key = %key,
                    error = %error,
                    "Discarding undecodable cache entry"
                );
                Ok(None)
            }
        }
    }

    /// Stores `value` under `key` with the cache TTL.
    #[tracing::instrument(skip(self, value), target = TRACING_TARGET)]
    pub async fn put(&self, key: &str, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.put(key, bytes, self.ttl).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            ttl_secs = self.ttl.as_secs(),
            "Cached value"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nlprag_core::{
        ClassifyOutput, InferenceResult, TaskId, TaskKind, TaskOutput, TaskResult,
    };

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    fn result() -> TaskResult {
        let output = TaskOutput::Classify(ClassifyOutput {
            category: "infectious".to_owned(),
            confidence: 0.9,
        });
        TaskResult::single(
            TaskId::generate(),
            TaskKind::Classify,
            InferenceResult::new(output, vec!["Influenza: fever".to_owned()]),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_round_trips_until_expiry() {
        let cache = ResultCache::<TaskResult>::in_memory(TTL);
        let written = result();
        let key = written.cache_key();

        cache.put(&key, &written).await.unwrap();

        tokio::time::advance(TTL / 2).await;
        assert_eq!(cache.get(&key).await.unwrap(), Some(written));

        tokio::time::advance(TTL / 2).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let backend = Arc::new(MemoryCache::new());
        backend
            .put("task_x_classify", b"print('pwned')".to_vec(), TTL)
            .await
            .unwrap();

        let cache = ResultCache::<TaskResult>::new(backend, TTL);
        assert_eq!(cache.get("task_x_classify").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_without_nats_url_uses_memory() {
        let cache = ResultCache::<TaskResult>::connect(&CacheConfig::default().with_ttl(60))
            .await
            .unwrap();
        assert_eq!(cache.backend_name(), "memory");
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
