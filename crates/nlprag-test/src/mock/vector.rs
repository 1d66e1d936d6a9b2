//! Vector backend with switchable failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nlprag_vector::{
    CollectionParams, Document, InMemoryBackend, Point, TextFilter, VectorBackend, VectorError,
    VectorResult,
};

/// In-memory vector backend whose search and upsert can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct FlakyVectorBackend {
    backend: Arc<InMemoryBackend>,
    fail_search: Arc<AtomicBool>,
    fail_upsert: Arc<AtomicBool>,
}

impl FlakyVectorBackend {
    /// Creates a healthy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped in-memory backend.
    pub fn inner(&self) -> &InMemoryBackend {
        &self.backend
    }

    /// Makes searches fail (or succeed again).
    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Makes upserts fail (or succeed again).
    pub fn set_fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl VectorBackend for FlakyVectorBackend {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.backend.list_collections().await
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.backend.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str, params: &CollectionParams) -> VectorResult<()> {
        self.backend.create_collection(name, params).await
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<()> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(VectorError::connection("vector store unavailable"));
        }
        self.backend.upsert(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        filter: Option<&TextFilter>,
    ) -> VectorResult<Vec<Document>> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(VectorError::connection("vector store unavailable"));
        }
        self.backend.search(collection, query, limit, filter).await
    }

    async fn count(&self, collection: &str) -> VectorResult<u64> {
        self.backend.count(collection).await
    }

    async fn max_point_id(&self, collection: &str) -> VectorResult<Option<u64>> {
        self.backend.max_point_id(collection).await
    }
}
