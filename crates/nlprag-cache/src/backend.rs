use std::time::Duration;

use async_trait::async_trait;

use crate::CacheResult;

/// Key/value store with per-key expiration.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the bytes stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Short backend name for logs and health reports.
    fn name(&self) -> &'static str;
}
