//! Per-task collection lifecycle.

use nlprag_core::{Error, Result, RetryPolicy, TaskKind};

use crate::{CollectionParams, TRACING_TARGET_COLLECTION, VectorError, VectorStore};

/// Point count of one collection, logged at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub kind: TaskKind,
    pub points: u64,
}

/// Ensures the per-task collections exist before the pipeline serves traffic.
#[derive(Debug, Clone)]
pub struct CollectionManager {
    store: VectorStore,
    params: CollectionParams,
    retry: RetryPolicy,
}

impl CollectionManager {
    /// Creates a manager using the store dimensionality and default parameters.
    pub fn new(store: VectorStore) -> Self {
        let params = CollectionParams::default().with_dimension(store.dimension());
        Self {
            store,
            params,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the storage parameters (dimension is kept from the store).
    pub fn with_params(mut self, params: CollectionParams) -> Self {
        self.params = params.with_dimension(self.store.dimension());
        self
    }

    /// Overrides the creation retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the parameters used for new collections.
    pub fn params(&self) -> &CollectionParams {
        &self.params
    }

    /// Creates the collection for `kind` unless it already exists.
    ///
    /// An existing collection still gets its payload indexes ensured. Losing a creation race to another initializer counts as success.
    /// Fails with [`ErrorKind::ResourceInit`] once the retry policy is exhausted.
    ///
    /// [`ErrorKind::ResourceInit`]: nlprag_core::ErrorKind::ResourceInit
    #[tracing::instrument(skip(self), target = TRACING_TARGET_COLLECTION)]
    pub async fn ensure_collection(&self, kind: TaskKind) -> Result<()> {
        let name = kind.collection_name();
        let backend = self.store.backend();

        let created = self
            .retry
            .retry(|| async {
                if backend.collection_exists(name).await? {
                    // A previous run may have created the collection but not its indexes.
                    backend.ensure_indexes(name).await?;
                    return Ok::<_, VectorError>(false);
                }

                match backend.create_collection(name, &self.params).await {
                    Ok(()) => Ok(true),
                    Err(err) if err.is_already_exists() => {
                        backend.ensure_indexes(name).await?;
                        Ok(false)
                    }
                    Err(err) => Err(err),
                }
            })
            .await
            .map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET_COLLECTION,
                    collection = %name,
                    attempts = self.retry.attempts(),
                    error = %err,
                    "Failed to create collection"
                );
                Error::resource_init()
                    .with_message(format!("failed to create collection {name}: {err}"))
                    .with_source(err)
            })?;

        if created {
            tracing::info!(
                target: TRACING_TARGET_COLLECTION,
                collection = %name,
                dimension = self.params.dimension,
                shard_number = self.params.shard_number,
                replication_factor = self.params.replication_factor,
                "Created collection"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET_COLLECTION,
                collection = %name,
                "Collection already exists, skipping creation"
            );
        }

        Ok(())
    }

    /// Ensures the collections of every task kind.
    pub async fn ensure_all(&self) -> Result<()> {
        for kind in TaskKind::ALL {
            self.ensure_collection(kind).await?;
        }
        Ok(())
    }

    /// Reports the point count of every task collection.
    pub async fn report(&self) -> Result<Vec<CollectionReport>> {
        let names = self.store.backend().list_collections().await?;
        tracing::info!(
            target: TRACING_TARGET_COLLECTION,
            collections = ?names,
            "Available collections"
        );

        let mut reports = Vec::with_capacity(TaskKind::ALL.len());
        for kind in TaskKind::ALL {
            let points = self.store.count(kind.collection_name()).await?;
            tracing::info!(
                target: TRACING_TARGET_COLLECTION,
                collection = %kind,
                points,
                "Collection point count"
            );
            reports.push(CollectionReport { kind, points });
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use nlprag_core::ErrorKind;

    use super::*;
    use crate::{Document, InMemoryBackend, Point, TextFilter, VectorBackend, VectorResult};

    #[tokio::test]
    async fn test_ensure_all_creates_every_collection() {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = CollectionManager::new(VectorStore::from_arc(backend.clone(), 8));

        manager.ensure_all().await.unwrap();
        manager.ensure_all().await.unwrap();

        assert_eq!(
            backend.list_collections().await.unwrap(),
            ["classify", "extract_entities", "sentiment", "summarize"]
        );

        let reports = manager.report().await.unwrap();
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.points == 0));
    }

    /// Fails creation a fixed number of times, then reports the race loss.
    struct FlakyBackend {
        inner: InMemoryBackend,
        create_failures: AtomicU32,
        create_calls: AtomicU32,
        index_calls: AtomicU32,
        lose_race: bool,
    }

    impl FlakyBackend {
        fn new(create_failures: u32, lose_race: bool) -> Self {
            Self {
                inner: InMemoryBackend::new(),
                create_failures: AtomicU32::new(create_failures),
                create_calls: AtomicU32::new(0),
                index_calls: AtomicU32::new(0),
                lose_race,
            }
        }
    }

    #[async_trait]
    impl VectorBackend for FlakyBackend {
        async fn list_collections(&self) -> VectorResult<Vec<String>> {
            self.inner.list_collections().await
        }

        async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
            self.inner.collection_exists(name).await
        }

        async fn create_collection(&self, name: &str, params: &CollectionParams) -> VectorResult<()> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.create_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.create_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(VectorError::connection("transient"));
            }

            if self.lose_race {
                self.inner.create_collection(name, params).await?;
                return Err(VectorError::already_exists(name));
            }

            self.inner.create_collection(name, params).await
        }

        async fn ensure_indexes(&self, _: &str) -> VectorResult<()> {
            self.index_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<()> {
            self.inner.upsert(collection, points).await
        }

        async fn search(
            &self,
            collection: &str,
            query: Vec<f32>,
            limit: usize,
            filter: Option<&TextFilter>,
        ) -> VectorResult<Vec<Document>> {
            self.inner.search(collection, query, limit, filter).await
        }

        async fn count(&self, collection: &str) -> VectorResult<u64> {
            self.inner.count(collection).await
        }

        async fn max_point_id(&self, collection: &str) -> VectorResult<Option<u64>> {
            self.inner.max_point_id(collection).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let backend = Arc::new(FlakyBackend::new(2, false));
        let manager = CollectionManager::new(VectorStore::from_arc(backend.clone(), 8));

        manager.ensure_collection(TaskKind::Classify).await.unwrap();
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 3);
        assert!(backend.collection_exists("classify").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_are_resource_init_errors() {
        let backend = Arc::new(FlakyBackend::new(10, false));
        let manager = CollectionManager::new(VectorStore::from_arc(backend.clone(), 8))
            .with_retry(RetryPolicy::fixed(3, Duration::from_secs(2)));

        let err = manager
            .ensure_collection(TaskKind::Sentiment)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceInit);
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_lost_creation_race_is_success() {
        let backend = Arc::new(FlakyBackend::new(0, true));
        let manager = CollectionManager::new(VectorStore::from_arc(backend.clone(), 8));

        manager.ensure_collection(TaskKind::Summarize).await.unwrap();
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.index_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_collection_gets_indexes_ensured() {
        let backend = Arc::new(FlakyBackend::new(0, false));
        backend
            .inner
            .create_collection("extract_entities", &CollectionParams::default())
            .await
            .unwrap();
        let manager = CollectionManager::new(VectorStore::from_arc(backend.clone(), 8));

        manager
            .ensure_collection(TaskKind::ExtractEntities)
            .await
            .unwrap();
        manager
            .ensure_collection(TaskKind::ExtractEntities)
            .await
            .unwrap();

        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.index_calls.load(Ordering::SeqCst), 2);
    }
}
