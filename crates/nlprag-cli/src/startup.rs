//! Steps run once before the server accepts traffic.

use anyhow::Context;
use nlprag_core::EMBEDDING_DIMENSION;
use nlprag_pipeline::{PipelineConfig, PipelineContext, SeedCorpus};
use nlprag_vector::qdrant::QdrantConfig;

use crate::TRACING_TARGET_SERVER_STARTUP;

/// Creates every missing task collection.
///
/// A collection that still cannot be created after retries aborts startup.
pub async fn prepare_collections(ctx: &PipelineContext, qdrant: &QdrantConfig) -> anyhow::Result<()> {
    ctx.collections()
        .with_params(qdrant.collection_params(EMBEDDING_DIMENSION))
        .ensure_all()
        .await
        .context("failed to initialize vector collections")
}

/// Seeds empty collections from the configured CSV file, if any.
pub async fn seed_collections(ctx: &PipelineContext, config: &PipelineConfig) -> anyhow::Result<()> {
    let Some(path) = &config.seed_csv_path else {
        tracing::debug!(target: TRACING_TARGET_SERVER_STARTUP, "No seed corpus configured");
        return Ok(());
    };

    let corpus = SeedCorpus::load(path, config.csv_limit, config.csv_max_length)
        .context("failed to load seed corpus")?;
    let written = corpus
        .seed(ctx)
        .await
        .context("failed to seed vector collections")?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        path = %path.display(),
        documents = written,
        "Seed corpus applied"
    );
    Ok(())
}

/// Logs the number of stored documents per collection.
///
/// A failing check is logged and does not stop the server.
pub async fn log_data_check(ctx: &PipelineContext) {
    match ctx.collections().report().await {
        Ok(report) => {
            for entry in report {
                tracing::info!(
                    target: TRACING_TARGET_SERVER_STARTUP,
                    collection = entry.kind.collection_name(),
                    points = entry.points,
                    "Collection ready"
                );
            }
        }
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_STARTUP,
                error = %err,
                "Data check failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qdrant_params_use_pipeline_dimension() {
        let params = QdrantConfig::default().collection_params(EMBEDDING_DIMENSION);
        assert_eq!(params.dimension, 1024);
        assert_eq!(params.shard_number, 2);
        assert_eq!(params.replication_factor, 2);
    }
}
