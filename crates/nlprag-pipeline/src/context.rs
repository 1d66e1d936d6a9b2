//! Application context shared by request handlers and background workers.

use nlprag_cache::ResultCache;
use nlprag_core::TaskResult;
use nlprag_provider::{EmbeddingGateway, InferenceService, Reranker};
use nlprag_vector::{CollectionManager, VectorStore};
use nlprag_webhook::WebhookService;

use crate::PipelineConfig;

/// Every external service the pipeline talks to, built once at startup.
///
/// Cheap to clone; clones share the underlying connections.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Inference oracle.
    pub inference: InferenceService,
    /// Embedding oracle behind the chunking gateway.
    pub embeddings: EmbeddingGateway,
    /// Best-effort reranker.
    pub reranker: Reranker,
    /// Vector store adapter.
    pub store: VectorStore,
    /// Result cache keyed by task identity.
    pub cache: ResultCache<TaskResult>,
    /// Notification sink, `None` disables webhooks.
    pub webhooks: Option<WebhookService>,
    /// Pipeline tuning.
    pub config: PipelineConfig,
}

impl PipelineContext {
    /// Creates a context with default configuration and no webhook delivery.
    pub fn new(
        inference: InferenceService,
        embeddings: EmbeddingGateway,
        reranker: Reranker,
        store: VectorStore,
        cache: ResultCache<TaskResult>,
    ) -> Self {
        Self {
            inference,
            embeddings,
            reranker,
            store,
            cache,
            webhooks: None,
            config: PipelineConfig::default(),
        }
    }

    /// Enables webhook delivery.
    pub fn with_webhooks(mut self, webhooks: WebhookService) -> Self {
        self.webhooks = Some(webhooks);
        self
    }

    /// Replaces the pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns a collection manager over the context's store.
    pub fn collections(&self) -> CollectionManager {
        CollectionManager::new(self.store.clone())
    }
}
