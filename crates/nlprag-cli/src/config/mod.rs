//! Every setting of the binary, one flattened group per component.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig        # Host, port, shutdown
//! ├── recovery: RecoveryConfig    # Request timeout
//! ├── provider: ProviderConfig    # Inference, embedding and rerank oracles
//! ├── qdrant: QdrantConfig        # Vector store
//! ├── cache: CacheConfig          # Result cache (NATS or memory)
//! ├── webhook: ReqwestConfig      # Webhook delivery
//! └── pipeline: PipelineConfig    # Retrieval, workers, seed corpus
//! ```
//!
//! Each option also reads an environment variable, see `nlprag --help`.

mod context;
mod server;

use anyhow::Context;
use clap::Parser;
use nlprag_cache::CacheConfig;
use nlprag_pipeline::PipelineConfig;
use nlprag_provider::ProviderConfig;
use nlprag_server::middleware::RecoveryConfig;
use nlprag_vector::qdrant::QdrantConfig;
use nlprag_webhook::reqwest::ReqwestConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use self::context::create_context;
use crate::TRACING_TARGET_CONFIG;

/// Command line of the `nlprag` server.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "nlprag")]
#[command(about = "Retrieval-augmented NLP inference server")]
#[command(version)]
pub struct Cli {
    /// Listener and shutdown.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Upstream inference, embedding and rerank services.
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// Qdrant vector store.
    #[clap(flatten)]
    pub qdrant: QdrantConfig,

    /// Result cache.
    #[clap(flatten)]
    pub cache: CacheConfig,

    /// Webhook delivery.
    #[clap(flatten)]
    pub webhook: ReqwestConfig,

    /// Pipeline tuning and seed corpus.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,
}

impl Cli {
    /// Parses arguments after loading `.env` when built with `dotenv`.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            // Tracing is not installed yet.
            eprintln!("ignoring unreadable .env: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering, `info` by default.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Checks values clap cannot check on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server.validate().context("listener settings")?;

        if self.pipeline.seed_csv_path.as_ref().is_some_and(|p| !p.is_file()) {
            anyhow::bail!("SEED_CSV_PATH does not point to a file");
        }

        Ok(())
    }

    /// Logs configuration without credentials.
    pub fn log(&self) {
        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            chat_base_url = %self.provider.chat_base_url,
            embed_base_url = %self.provider.embed_base_url,
            rerank_base_url = %self.provider.rerank_base_url,
            chat_model = %self.provider.chat_model,
            embed_model = %self.provider.embed_model,
            rerank_model = %self.provider.rerank_model,
            http_timeout_secs = self.provider.http_timeout,
            api_key_set = self.provider.api_key.is_some(),
            "Upstream configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            qdrant_url = %self.qdrant.qdrant_url,
            shard_number = self.qdrant.qdrant_shard_number,
            replication_factor = self.qdrant.qdrant_replication_factor,
            cache = if self.cache.nats_url.is_some() { "nats" } else { "memory" },
            cache_ttl_secs = self.cache.cache_ttl,
            "Storage configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            retrieval_limit = self.pipeline.retrieval_limit,
            max_concurrent_jobs = self.pipeline.max_concurrent_jobs,
            worker_threads = self.pipeline.worker_threads,
            seed_csv_path = ?self.pipeline.seed_csv_path,
            request_timeout_secs = self.recovery.request_timeout,
            webhook_signed = self.webhook.secret.is_some(),
            "Pipeline configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["nlprag", "--api-key", "secret"]).unwrap();
        assert_eq!(cli.server.port, 8000);
        assert_eq!(cli.pipeline.retrieval_limit, 5);
        assert_eq!(cli.pipeline.max_concurrent_jobs, 10);
        assert_eq!(cli.cache.cache_ttl, 3600);
        assert_eq!(cli.qdrant.qdrant_shard_number, 2);
        assert_eq!(cli.provider.chat_model, "usf1-mini");
        assert_eq!(cli.provider.api_key.as_deref(), Some("secret"));
        assert!(cli.validate().is_ok());
    }
}
