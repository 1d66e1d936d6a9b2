#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod context;
mod output;
mod pipeline;
mod seed;
mod worker;

pub use config::{DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_RETRIEVAL_LIMIT, PipelineConfig};
pub use context::PipelineContext;
pub use output::{parse_or_stub, strip_fences};
pub use pipeline::{ExecutionMode, Pipeline};
pub use seed::{SeedCorpus, SeedRecord};
pub use worker::{JobQueue, WorkerPool};

/// Tracing target for pipeline operations.
pub const TRACING_TARGET: &str = "nlprag_pipeline";

/// Tracing target for background worker operations.
pub const TRACING_TARGET_WORKER: &str = "nlprag_pipeline::worker";

/// Tracing target for seed corpus operations.
pub const TRACING_TARGET_SEED: &str = "nlprag_pipeline::seed";
