//! Vector store adapter with atomic point-id allocation.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, OnceCell};

use crate::{Document, Point, TRACING_TARGET, TextFilter, VectorBackend, VectorError, VectorResult};

/// Hands out disjoint id ranges for one collection.
///
/// The counter is seeded once from the backend's highest stored id; every
/// later reservation is a single `fetch_add`.
#[derive(Debug, Default)]
struct PointIdAllocator {
    next: OnceCell<AtomicU64>,
}

impl PointIdAllocator {
    async fn reserve(
        &self,
        backend: &dyn VectorBackend,
        collection: &str,
        count: u64,
    ) -> VectorResult<Range<u64>> {
        let next = self
            .next
            .get_or_try_init(|| async {
                let start = backend
                    .max_point_id(collection)
                    .await?
                    .map_or(0, |max| max + 1);

                tracing::debug!(
                    target: TRACING_TARGET,
                    collection = %collection,
                    next_id = start,
                    "Initialized point id allocator"
                );
                Ok::<_, VectorError>(AtomicU64::new(start))
            })
            .await?;

        let start = next.fetch_add(count, Ordering::SeqCst);
        Ok(start..start + count)
    }
}

struct VectorStoreInner {
    backend: Arc<dyn VectorBackend>,
    dimension: usize,
    allocators: Mutex<HashMap<String, Arc<PointIdAllocator>>>,
}

/// Vector store adapter shared by request handlers and background workers.
///
/// Cheap to clone; all clones share the backend connection and id allocators.
#[derive(Clone)]
pub struct VectorStore {
    inner: Arc<VectorStoreInner>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("dimension", &self.inner.dimension)
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Creates a store over the given backend expecting vectors of `dimension`.
    pub fn new(backend: impl VectorBackend + 'static, dimension: usize) -> Self {
        Self::from_arc(Arc::new(backend), dimension)
    }

    /// Creates a store over a shared backend.
    pub fn from_arc(backend: Arc<dyn VectorBackend>, dimension: usize) -> Self {
        Self {
            inner: Arc::new(VectorStoreInner {
                backend,
                dimension,
                allocators: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the expected vector dimensionality.
    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &dyn VectorBackend {
        self.inner.backend.as_ref()
    }

    async fn allocator(&self, collection: &str) -> Arc<PointIdAllocator> {
        let mut allocators = self.inner.allocators.lock().await;
        allocators
            .entry(collection.to_owned())
            .or_default()
            .clone()
    }

    /// Appends documents under freshly allocated ascending ids.
    ///
    /// Every vector must match the store dimensionality, otherwise nothing is
    /// written. Returns the assigned ids in input order.
    #[tracing::instrument(skip(self, documents), fields(count = documents.len()), target = TRACING_TARGET)]
    pub async fn upsert(
        &self,
        collection: &str,
        documents: Vec<(String, Vec<f32>)>,
    ) -> VectorResult<Vec<u64>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        if let Some((_, vector)) = documents
            .iter()
            .find(|(_, vector)| vector.len() != self.inner.dimension)
        {
            return Err(VectorError::dimension_mismatch(
                self.inner.dimension,
                vector.len(),
            ));
        }

        let ids = self
            .allocator(collection)
            .await
            .reserve(self.backend(), collection, documents.len() as u64)
            .await?;

        let points: Vec<Point> = ids
            .clone()
            .zip(documents)
            .map(|(id, (text, vector))| Point { id, text, vector })
            .collect();

        self.backend().upsert(collection, points).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection,
            first_id = ids.start,
            last_id = ids.end - 1,
            "Upserted documents"
        );

        Ok(ids.collect())
    }

    /// Returns the `limit` most similar documents.
    ///
    /// Never fails: an empty collection yields no documents and a backend
    /// failure is logged and degrades to an empty result.
    #[tracing::instrument(skip(self, query, filter), target = TRACING_TARGET)]
    pub async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        filter: Option<&TextFilter>,
    ) -> Vec<Document> {
        match self.backend().search(collection, query, limit, filter).await {
            Ok(documents) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    collection = %collection,
                    filtered = filter.is_some(),
                    count = documents.len(),
                    "Retrieved documents"
                );
                documents
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    collection = %collection,
                    error = %err,
                    "Search failed, continuing without related documents"
                );
                Vec::new()
            }
        }
    }

    /// Returns the number of points in a collection.
    ///
    /// For diagnostics only, ids are never derived from it.
    pub async fn count(&self, collection: &str) -> VectorResult<u64> {
        self.backend().count(collection).await
    }
}
