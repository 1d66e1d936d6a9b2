//! Mock rerank provider for testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nlprag_core::{Error, Result};
use nlprag_provider::RerankProvider;

/// How the mock reranker answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RerankBehavior {
    /// Returns the candidates unchanged.
    #[default]
    Identity,
    /// Returns the candidates in reverse order.
    Reverse,
    /// Fails every call.
    Fail,
}

/// Mock rerank provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockRerankProvider {
    behavior: RerankBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockRerankProvider {
    /// Creates a provider with the given behavior.
    pub fn new(behavior: RerankBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::default(),
        }
    }

    /// Returns the number of rerank calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RerankProvider for MockRerankProvider {
    async fn rerank(&self, _query: &str, documents: &[String]) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            RerankBehavior::Identity => Ok(documents.to_vec()),
            RerankBehavior::Reverse => Ok(documents.iter().rev().cloned().collect()),
            RerankBehavior::Fail => Err(Error::upstream()
                .with_status(502)
                .with_message("mock rerank failure")),
        }
    }
}
