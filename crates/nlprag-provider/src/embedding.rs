//! Embedding service and gateway.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use nlprag_core::{EMBEDDING_DIMENSION, Error, Result};
use serde::{Deserialize, Serialize};

use crate::{HttpClient, TRACING_TARGET_EMBEDDING};

/// Maximum number of texts sent in one upstream embedding call.
pub const EMBEDDING_BATCH_SIZE: usize = 32;

/// A service that maps texts to vectors.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `texts` in one upstream call, returning vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    result: EmbeddingResult,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResult {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP client for the embedding service.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    client: HttpClient,
}

impl HttpEmbeddingClient {
    /// Creates an embedding client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let config = self.client.config();
        let request = EmbeddingRequest {
            model: &config.embed_model,
            input: texts,
        };

        let response: EmbeddingResponse = self
            .client
            .post_json(&config.embed_base_url, "embeddings", &request)
            .await?;

        Ok(response
            .result
            .data
            .into_iter()
            .map(|data| data.embedding)
            .collect())
    }
}

/// Embedding gateway: chunks input, preserves order and validates dimensionality.
#[derive(Clone)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    batch_size: usize,
}

impl fmt::Debug for EmbeddingGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingGateway")
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl EmbeddingGateway {
    /// Creates a gateway expecting [`EMBEDDING_DIMENSION`]-sized vectors.
    pub fn new<P>(provider: P) -> Self
    where
        P: EmbeddingProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a gateway over a shared provider.
    pub fn from_arc(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            dimension: EMBEDDING_DIMENSION,
            batch_size: EMBEDDING_BATCH_SIZE,
        }
    }

    /// Sets the expected vector dimensionality.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Sets the maximum chunk size, at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Returns the expected vector dimensionality.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embeds `texts`, returning exactly one vector per input in input order.
    ///
    /// Input is split into chunks of at most the batch size. A vector of the
    /// wrong length, or a chunk answered with the wrong number of vectors, is a
    /// [`DataShape`] error. Empty input is rejected.
    ///
    /// [`DataShape`]: nlprag_core::ErrorKind::DataShape
    #[tracing::instrument(skip_all, fields(count = texts.len()), target = TRACING_TARGET_EMBEDDING)]
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::invalid_input().with_message("cannot embed an empty batch"));
        }

        let started_at = Timestamp::now();
        let mut vectors = Vec::with_capacity(texts.len());

        for (index, chunk) in texts.chunks(self.batch_size).enumerate() {
            let embedded = self.provider.embed_batch(chunk).await?;

            if embedded.len() != chunk.len() {
                return Err(Error::data_shape().with_message(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    embedded.len()
                )));
            }

            if let Some(vector) = embedded.iter().find(|v| v.len() != self.dimension) {
                tracing::error!(
                    target: TRACING_TARGET_EMBEDDING,
                    expected = self.dimension,
                    actual = vector.len(),
                    "Embedding dimensionality mismatch"
                );
                return Err(Error::data_shape().with_message(format!(
                    "expected {}-dimensional embeddings, got {}",
                    self.dimension,
                    vector.len()
                )));
            }

            tracing::trace!(
                target: TRACING_TARGET_EMBEDDING,
                chunk = index,
                size = chunk.len(),
                "Embedded chunk"
            );
            vectors.extend(embedded);
        }

        tracing::debug!(
            target: TRACING_TARGET_EMBEDDING,
            count = vectors.len(),
            elapsed_ms = Timestamp::now().duration_since(started_at).as_millis(),
            "Embedding completed"
        );

        Ok(vectors)
    }

    /// Embeds a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_owned()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::data_shape().with_message("no embedding returned"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use nlprag_core::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ProviderConfig;

    /// Encodes each text's numeric suffix in the first component, recording chunk sizes.
    #[derive(Default)]
    struct IndexEmbedder {
        dimension: usize,
        chunks: Mutex<Vec<usize>>,
        drop_last: bool,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for IndexEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.chunks.lock().unwrap().push(texts.len());
            let mut vectors: Vec<Vec<f32>> = texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0; self.dimension];
                    v[0] = text.trim_start_matches("text-").parse::<f32>().unwrap();
                    v
                })
                .collect();
            if self.drop_last {
                vectors.pop();
            }
            Ok(vectors)
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text-{i}")).collect()
    }

    #[tokio::test]
    async fn test_embed_chunks_and_preserves_order() {
        let provider = Arc::new(IndexEmbedder {
            dimension: 4,
            ..Default::default()
        });
        let gateway = EmbeddingGateway::from_arc(provider.clone()).with_dimension(4);

        let vectors = gateway.embed(&texts(70)).await.unwrap();

        assert_eq!(vectors.len(), 70);
        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector[0], i as f32);
        }
        assert_eq!(*provider.chunks.lock().unwrap(), [32, 32, 6]);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_data_shape_error() {
        let gateway = EmbeddingGateway::new(IndexEmbedder {
            dimension: 3,
            ..Default::default()
        });

        let err = gateway.embed(&texts(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
    }

    #[tokio::test]
    async fn test_missing_vector_is_data_shape_error() {
        let gateway = EmbeddingGateway::new(IndexEmbedder {
            dimension: 4,
            drop_last: true,
            ..Default::default()
        })
        .with_dimension(4);

        let err = gateway.embed(&texts(3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let gateway = EmbeddingGateway::new(IndexEmbedder::default());
        let err = gateway.embed(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_http_client_reads_result_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_json(json!({"model": "usf1-embed", "input": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"data": [
                    {"embedding": [1.0, 0.0]},
                    {"embedding": [0.0, 1.0]}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(
            ProviderConfig::default()
                .with_base_url(server.uri())
                .with_api_key("test-key"),
        )
        .unwrap();
        let gateway = EmbeddingGateway::new(HttpEmbeddingClient::new(client)).with_dimension(2);

        let vectors = gateway
            .embed(&["a".to_owned(), "b".to_owned()])
            .await
            .unwrap();
        assert_eq!(vectors, [vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_http_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = HttpClient::new(
            ProviderConfig::default()
                .with_base_url(server.uri())
                .with_api_key("test-key"),
        )
        .unwrap();
        let gateway = EmbeddingGateway::new(HttpEmbeddingClient::new(client));

        let err = gateway.embed_one("query").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamService);
        assert_eq!(err.status(), Some(502));
    }
}
