#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod memory;
mod store;

#[cfg(feature = "nats")]
#[cfg_attr(docsrs, doc(cfg(feature = "nats")))]
pub mod nats;

pub use backend::CacheBackend;
pub use config::{CacheConfig, DEFAULT_TTL_SECS};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use store::ResultCache;

/// Tracing target for cache operations.
pub const TRACING_TARGET: &str = "nlprag_cache";
