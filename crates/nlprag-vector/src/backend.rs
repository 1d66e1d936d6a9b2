//! Backend abstraction over a vector similarity store.

use async_trait::async_trait;
use nlprag_core::EMBEDDING_DIMENSION;
use serde::{Deserialize, Serialize};

use crate::VectorResult;

/// Parameters used when creating a collection.
///
/// Shard and replica counts are deployment tuning and carry no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionParams {
    /// Fixed vector dimensionality.
    pub dimension: usize,
    /// Number of shards.
    pub shard_number: u32,
    /// Number of replicas per shard.
    pub replication_factor: u32,
}

impl Default for CollectionParams {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIMENSION,
            shard_number: 2,
            replication_factor: 2,
        }
    }
}

impl CollectionParams {
    /// Sets the vector dimensionality.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

/// A vector with its payload text, addressed by an explicit id.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: u64,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A stored document returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub text: String,
    pub score: f32,
}

/// Restricts a search to documents whose text contains a substring,
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    needle: String,
}

impl TextFilter {
    /// Creates a filter for the given substring.
    pub fn contains(text: impl AsRef<str>) -> Self {
        Self {
            needle: text.as_ref().to_lowercase(),
        }
    }

    /// Returns the lowercased substring.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns whether the text satisfies this filter.
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle)
    }
}

/// Operations the pipeline needs from a vector store service.
///
/// Implementations must be safe for concurrent use. They store whatever ids
/// they are given; id allocation is the caller's responsibility.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Lists the names of all collections.
    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    /// Checks whether a collection exists.
    async fn collection_exists(&self, name: &str) -> VectorResult<bool>;

    /// Creates a collection.
    ///
    /// Returns [`VectorError::AlreadyExists`] when the collection is already present.
    ///
    /// [`VectorError::AlreadyExists`]: crate::VectorError::AlreadyExists
    async fn create_collection(&self, name: &str, params: &CollectionParams) -> VectorResult<()>;

    /// Creates the payload indexes of an existing collection.
    ///
    /// Must succeed when the indexes are already present. Backends without
    /// payload indexes keep the default.
    async fn ensure_indexes(&self, name: &str) -> VectorResult<()> {
        let _ = name;
        Ok(())
    }

    /// Inserts or overwrites points by id.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<()>;

    /// Returns up to `limit` documents ordered by descending similarity.
    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        filter: Option<&TextFilter>,
    ) -> VectorResult<Vec<Document>>;

    /// Returns the number of points in a collection.
    async fn count(&self, collection: &str) -> VectorResult<u64>;

    /// Returns the highest point id in a collection, `None` when empty.
    async fn max_point_id(&self, collection: &str) -> VectorResult<Option<u64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_filter_is_case_insensitive() {
        let filter = TextFilter::contains("Infectious");
        assert_eq!(filter.needle(), "infectious");
        assert!(filter.matches("Tuberculosis: an INFECTIOUS disease"));
        assert!(!filter.matches("Diabetes: a chronic condition"));
    }

    #[test]
    fn test_default_params() {
        let params = CollectionParams::default();
        assert_eq!(params.dimension, 1024);
        assert_eq!(params.shard_number, 2);
        assert_eq!(params.replication_factor, 2);
    }
}
