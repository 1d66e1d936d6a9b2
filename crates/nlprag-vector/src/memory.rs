//! In-process vector backend with brute-force cosine search.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CollectionParams, Document, Point, TextFilter, VectorBackend, VectorError, VectorResult};

#[derive(Debug)]
struct MemoryCollection {
    params: CollectionParams,
    points: BTreeMap<u64, (String, Vec<f32>)>,
}

/// Vector backend that keeps every collection in memory.
///
/// Enforces the collection dimensionality on insert like a real store would.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ids stored in a collection, in ascending order.
    pub async fn point_ids(&self, collection: &str) -> VectorResult<Vec<u64>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;
        Ok(stored.points.keys().copied().collect())
    }

    /// Returns the stored texts of a collection, ordered by id.
    pub async fn texts(&self, collection: &str) -> VectorResult<Vec<String>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;
        Ok(stored.points.values().map(|(text, _)| text.clone()).collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let mut names: Vec<_> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, params: &CollectionParams) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(VectorError::already_exists(name));
        }

        collections.insert(
            name.to_owned(),
            MemoryCollection {
                params: *params,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;

        if let Some(point) = points.iter().find(|p| p.vector.len() != stored.params.dimension) {
            return Err(VectorError::dimension_mismatch(
                stored.params.dimension,
                point.vector.len(),
            ));
        }

        for point in points {
            stored.points.insert(point.id, (point.text, point.vector));
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        filter: Option<&TextFilter>,
    ) -> VectorResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;

        if query.len() != stored.params.dimension {
            return Err(VectorError::dimension_mismatch(
                stored.params.dimension,
                query.len(),
            ));
        }

        let mut hits: Vec<Document> = stored
            .points
            .iter()
            .filter(|(_, (text, _))| filter.is_none_or(|f| f.matches(text)))
            .map(|(id, (text, vector))| Document {
                id: *id,
                text: text.clone(),
                score: cosine_similarity(&query, vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> VectorResult<u64> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;
        Ok(stored.points.len() as u64)
    }

    async fn max_point_id(&self, collection: &str) -> VectorResult<Option<u64>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;
        Ok(stored.points.keys().next_back().copied())
    }
}
