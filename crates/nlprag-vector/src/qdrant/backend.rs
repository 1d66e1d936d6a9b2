//! Qdrant backend implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    Direction, Distance, FieldType, Filter, OrderByBuilder, PointId, PointStruct,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};

use super::QdrantConfig;
use crate::{
    CollectionParams, Document, Point, TRACING_TARGET, TextFilter, VectorBackend, VectorError,
    VectorResult,
};

/// Payload field holding the original document text.
const FIELD_TEXT: &str = "text";
/// Payload field holding the lowercased text, matched by category filters.
const FIELD_TEXT_LOWER: &str = "text_lower";
/// Payload field mirroring the point id, indexed so the highest id can be found.
const FIELD_SEQ: &str = "seq";

/// Qdrant backend implementation.
pub struct QdrantBackend {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantBackend").finish_non_exhaustive()
    }
}

fn backend_error(err: QdrantError) -> VectorError {
    VectorError::backend(err.to_string())
}

/// Returns whether a scroll failed only because the `order_by` field has no
/// range index, as on collections created before the `seq` index existed.
fn is_missing_order_index(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("order_by") && message.contains("index")
}

impl QdrantBackend {
    /// Creates a new Qdrant backend.
    pub fn new(config: &QdrantConfig) -> VectorResult<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .api_key(config.qdrant_api_key.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.qdrant_url,
            "Connected to Qdrant"
        );

        Ok(Self { client })
    }

    /// Extracts a numeric point id.
    fn extract_point_id(id: Option<PointId>) -> Option<u64> {
        match id {
            Some(PointId {
                point_id_options: Some(PointIdOptions::Num(n)),
            }) => Some(n),
            _ => None,
        }
    }

    /// Extracts a string payload field.
    fn extract_text(payload: &HashMap<String, Value>) -> Option<String> {
        match payload.get(FIELD_TEXT).and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn payload(point: &Point) -> HashMap<String, Value> {
        HashMap::from([
            (FIELD_TEXT.to_owned(), Value::from(point.text.clone())),
            (FIELD_TEXT_LOWER.to_owned(), Value::from(point.text.to_lowercase())),
            (FIELD_SEQ.to_owned(), Value::from(point.id as i64)),
        ])
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self.client.list_collections().await.map_err(backend_error)?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(backend_error)
    }

    async fn create_collection(&self, name: &str, params: &CollectionParams) -> VectorResult<()> {
        let request = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(
                params.dimension as u64,
                Distance::Cosine,
            ))
            .shard_number(params.shard_number)
            .replication_factor(params.replication_factor);

        if let Err(err) = self.client.create_collection(request).await {
            let message = err.to_string();
            return Err(if message.contains("already exists") {
                VectorError::already_exists(name)
            } else {
                VectorError::backend(message)
            });
        }

        self.ensure_indexes(name).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            collection = %name,
            dimension = params.dimension,
            "Created Qdrant collection"
        );

        Ok(())
    }

    async fn ensure_indexes(&self, name: &str) -> VectorResult<()> {
        // Qdrant accepts a repeated request for an index with the same schema.
        self.client
            .create_field_index(
                CreateFieldIndexCollectionBuilder::new(name, FIELD_SEQ, FieldType::Integer)
                    .wait(true),
            )
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<()> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let payload = Self::payload(&point);
                PointStruct::new(point.id, point.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        filter: Option<&TextFilter>,
    ) -> VectorResult<Vec<Document>> {
        let mut search =
            SearchPointsBuilder::new(collection, query, limit as u64).with_payload(true);

        // Without a full-text index on the field, Qdrant matches text as a plain substring.
        if let Some(filter) = filter {
            search = search.filter(Filter::must([Condition::matches_text(
                FIELD_TEXT_LOWER,
                filter.needle(),
            )]));
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(backend_error)?;

        let documents = response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = Self::extract_point_id(point.id)?;
                let text = Self::extract_text(&point.payload)?;
                Some(Document {
                    id,
                    text,
                    score: point.score,
                })
            })
            .collect();

        Ok(documents)
    }

    async fn count(&self, collection: &str) -> VectorResult<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(backend_error)?;

        Ok(response.result.map(|r| r.count).unwrap_or_default())
    }

    async fn max_point_id(&self, collection: &str) -> VectorResult<Option<u64>> {
        let scroll = ScrollPointsBuilder::new(collection)
            .limit(1)
            .with_payload(false)
            .order_by(OrderByBuilder::new(FIELD_SEQ).direction(Direction::Desc as i32));

        match self.client.scroll(scroll).await {
            Ok(response) => Ok(response
                .result
                .into_iter()
                .next()
                .and_then(|point| Self::extract_point_id(point.id))),
            Err(err) if is_missing_order_index(&err.to_string()) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    collection = %collection,
                    error = %err,
                    "Collection has no seq index, deriving next id from point count"
                );
                let count = self.count(collection).await?;
                Ok(count.checked_sub(1))
            }
            // Ids may have gaps, so the count is only a seed when ordering is impossible.
            Err(err) => Err(backend_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_order_index_falls_back_to_count() {
        assert!(is_missing_order_index(
            "Error in the response: Bad request: No range index for `order_by` key: `seq`. \
             Please create one to use `order_by`."
        ));

        assert!(!is_missing_order_index("Error in the response: Timeout expired"));
        assert!(!is_missing_order_index(
            "Error in the response: Service unavailable: transport error"
        ));
        assert!(!is_missing_order_index("Not found: Collection `classify` doesn't exist!"));
    }
}
