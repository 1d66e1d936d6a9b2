//! In-process cache backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{CacheBackend, CacheResult};

#[derive(Debug)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Writes between two sweeps of expired entries.
const SWEEP_INTERVAL: usize = 256;

/// Cache backend keeping entries in memory.
///
/// Expiry is measured with the tokio clock and checked on read. Writes
/// sweep expired entries every [`SWEEP_INTERVAL`] inserts, so keys that are
/// never read again still leave the map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let entry = MemoryEntry {
            value,
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            entries.retain(|_, held| !held.is_expired(now));
        }
        entries.insert(key.to_owned(), entry);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache.put("task_1_classify", b"v1".to_vec(), TTL).await.unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(
            cache.get("task_1_classify").await.unwrap().as_deref(),
            Some(&b"v1"[..])
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("task_1_classify").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_replaces_value_and_ttl() {
        let cache = MemoryCache::new();
        cache.put("k", b"old".to_vec(), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("k", b"new".to_vec(), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache.put("short", b"a".to_vec(), Duration::from_secs(1)).await.unwrap();
        cache.put("long", b"b".to_vec(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_evict_expired_unread_entries() {
        let cache = MemoryCache::new();
        for i in 0..1000 {
            let key = format!("task_{i}_classify");
            cache.put(&key, b"r".to_vec(), TTL).await.unwrap();
        }
        assert_eq!(cache.len().await, 1000);

        tokio::time::advance(TTL * 2).await;
        for i in 0..SWEEP_INTERVAL {
            let key = format!("task_fresh_{i}_classify");
            cache.put(&key, b"r".to_vec(), TTL).await.unwrap();
        }

        assert!(cache.len().await <= SWEEP_INTERVAL);
        assert!(cache.get("task_fresh_0_classify").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").await.unwrap().is_none());
    }
}
