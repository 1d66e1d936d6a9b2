//! Builds the pipeline context from configuration.

use anyhow::Context;
use nlprag_cache::ResultCache;
use nlprag_core::EMBEDDING_DIMENSION;
use nlprag_pipeline::PipelineContext;
use nlprag_provider::{
    ChatCompletionClient, EmbeddingGateway, HttpClient, HttpEmbeddingClient, HttpRerankClient,
    Reranker,
};
use nlprag_vector::VectorStore;
use nlprag_vector::qdrant::QdrantBackend;
use nlprag_webhook::reqwest::ReqwestClient;

use super::Cli;
use crate::TRACING_TARGET_SERVER_STARTUP;

/// Connects every external service and returns the shared context.
///
/// Fails when the API key is missing or a client cannot be created.
pub async fn create_context(cli: &Cli) -> anyhow::Result<PipelineContext> {
    let client = HttpClient::new(cli.provider.clone())
        .context("failed to create upstream client")?;

    let inference = ChatCompletionClient::new(client.clone()).into_service();
    let embeddings = EmbeddingGateway::new(HttpEmbeddingClient::new(client.clone()))
        .with_dimension(EMBEDDING_DIMENSION);
    let reranker = Reranker::new(HttpRerankClient::new(client));

    let backend = QdrantBackend::new(&cli.qdrant).context("failed to create Qdrant client")?;
    let store = VectorStore::new(backend, EMBEDDING_DIMENSION);

    let cache = ResultCache::connect(&cli.cache)
        .await
        .context("failed to open result cache")?;

    let webhooks = ReqwestClient::new(cli.webhook.clone())
        .context("failed to create webhook client")?
        .into_service();

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        cache = cache.backend_name(),
        dimension = EMBEDDING_DIMENSION,
        "Created application context"
    );

    Ok(
        PipelineContext::new(inference, embeddings, reranker, store, cache)
            .with_webhooks(webhooks)
            .with_config(cli.pipeline.clone()),
    )
}
