#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod health;
mod retry;

pub mod output;
pub mod request;
pub mod result;
pub mod task;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use output::{
    ClassifyOutput, EntitiesOutput, SentimentOutput, SummaryOutput, TaskOutput,
};
pub use request::{DEFAULT_CATEGORIES, InferenceRequest};
pub use result::{BatchItem, BatchResult, InferenceResult, TaskPayload, TaskResult};
pub use retry::RetryPolicy;
pub use task::{TaskId, TaskKind};

/// Tracing target for retry operations.
pub const TRACING_TARGET_RETRY: &str = "nlprag_core::retry";

/// Dimensionality of every embedding vector stored by the pipeline.
pub const EMBEDDING_DIMENSION: usize = 1024;
