//! Reqwest-based HTTP client for webhook delivery.
//!
//! # Example
//!
//! ```rust,ignore
//! use nlprag_webhook::reqwest::{ReqwestClient, ReqwestConfig};
//!
//! let client = ReqwestClient::new(ReqwestConfig::default())?;
//! let service = client.into_service();
//! service.notify("https://example.com/hook", &task_result).await;
//! ```

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::ReqwestConfig;
pub use error::Error;

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "nlprag_webhook::reqwest";
