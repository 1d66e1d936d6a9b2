#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub mod embedding;
pub mod inference;
pub mod rerank;

pub use client::HttpClient;
pub use config::ProviderConfig;
pub use embedding::{EMBEDDING_BATCH_SIZE, EmbeddingGateway, EmbeddingProvider, HttpEmbeddingClient};
pub use error::HttpError;
pub use inference::{ChatCompletionClient, InferenceProvider, InferenceService};
pub use rerank::{HttpRerankClient, RerankProvider, Reranker};

/// Tracing target for HTTP client operations.
pub const TRACING_TARGET_CLIENT: &str = "nlprag_provider::client";

/// Tracing target for inference operations.
pub const TRACING_TARGET_INFERENCE: &str = "nlprag_provider::inference";

/// Tracing target for embedding operations.
pub const TRACING_TARGET_EMBEDDING: &str = "nlprag_provider::embedding";

/// Tracing target for reranking operations.
pub const TRACING_TARGET_RERANK: &str = "nlprag_provider::rerank";
