#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod collection;
mod error;
mod memory;
mod store;

#[cfg(feature = "qdrant")]
#[cfg_attr(docsrs, doc(cfg(feature = "qdrant")))]
pub mod qdrant;

pub use backend::{CollectionParams, Document, Point, TextFilter, VectorBackend};
pub use collection::{CollectionManager, CollectionReport};
pub use error::{VectorError, VectorResult};
pub use memory::InMemoryBackend;
pub use store::VectorStore;

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "nlprag_vector";

/// Tracing target for collection lifecycle operations.
pub const TRACING_TARGET_COLLECTION: &str = "nlprag_vector::collection";
