//! Mock implementations of the external services for testing.
//!
//! The mocks are deterministic and keep call counters so tests can assert on
//! which upstream calls were made.

mod embedding;
mod inference;
mod rerank;
mod vector;
mod webhook;

pub use embedding::MockEmbeddingProvider;
pub use inference::MockInferenceProvider;
use nlprag_provider::{EmbeddingGateway, InferenceService, Reranker};
pub use rerank::{MockRerankProvider, RerankBehavior};
pub use vector::FlakyVectorBackend;
pub use webhook::RecordingWebhook;

/// Provider-level services backed by mocks, with handles to the mocks.
#[derive(Debug, Clone)]
pub struct MockServices {
    pub inference: InferenceService,
    pub embeddings: EmbeddingGateway,
    pub reranker: Reranker,
    pub inference_mock: MockInferenceProvider,
    pub embedding_mock: MockEmbeddingProvider,
    pub rerank_mock: MockRerankProvider,
}

/// Creates mock services producing vectors of `dimension`.
///
/// Inference answers with task-appropriate JSON and reranking keeps the
/// retrieval order.
pub fn create_mock_services(dimension: usize) -> MockServices {
    let inference_mock = MockInferenceProvider::new();
    let embedding_mock = MockEmbeddingProvider::new(dimension);
    let rerank_mock = MockRerankProvider::default();

    MockServices {
        inference: InferenceService::new(inference_mock.clone()),
        embeddings: EmbeddingGateway::new(embedding_mock.clone()).with_dimension(dimension),
        reranker: Reranker::new(rerank_mock.clone()),
        inference_mock,
        embedding_mock,
        rerank_mock,
    }
}
