//! Reranking service.

use std::fmt;
use std::sync::Arc;

use nlprag_core::Result;
use serde::{Deserialize, Serialize};

use crate::{HttpClient, TRACING_TARGET_RERANK};

/// A service that reorders documents by relevance to a query.
#[async_trait::async_trait]
pub trait RerankProvider: Send + Sync {
    /// Returns `documents` reordered by relevance to `query`.
    async fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<String>>;
}

#[derive(Debug, Serialize)]
struct RerankInput<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    input: RerankInput<'a>,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    ranked_documents: Vec<String>,
}

/// HTTP client for the reranking service.
#[derive(Debug, Clone)]
pub struct HttpRerankClient {
    client: HttpClient,
}

impl HttpRerankClient {
    /// Creates a reranking client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RerankProvider for HttpRerankClient {
    async fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<String>> {
        let config = self.client.config();
        let request = RerankRequest {
            model: &config.rerank_model,
            input: RerankInput { query, documents },
        };

        let response: RerankResponse = self
            .client
            .post_json(&config.rerank_base_url, "reranker", &request)
            .await?;

        Ok(response.ranked_documents)
    }
}

/// Returns whether `ranked` holds exactly the `candidates`, in any order.
fn is_permutation(candidates: &[String], ranked: &[String]) -> bool {
    if candidates.len() != ranked.len() {
        return false;
    }

    let mut expected: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let mut actual: Vec<&str> = ranked.iter().map(String::as_str).collect();
    expected.sort_unstable();
    actual.sort_unstable();
    expected == actual
}

/// Best-effort reranker that never fails.
#[derive(Clone)]
pub struct Reranker {
    provider: Arc<dyn RerankProvider>,
}

impl fmt::Debug for Reranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reranker").finish_non_exhaustive()
    }
}

impl Reranker {
    /// Creates a reranker from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: RerankProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a reranker over a shared provider.
    pub fn from_arc(provider: Arc<dyn RerankProvider>) -> Self {
        Self { provider }
    }

    /// Reorders `candidates` by relevance to `query`.
    ///
    /// Empty input is returned without calling the service. A failure, or an
    /// answer that is not a reordering of the candidates, returns the
    /// candidates in their original order.
    #[tracing::instrument(skip_all, fields(count = candidates.len()), target = TRACING_TARGET_RERANK)]
    pub async fn rerank(&self, query: &str, candidates: Vec<String>) -> Vec<String> {
        if candidates.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_RERANK,
                "No documents to rerank"
            );
            return candidates;
        }

        match self.provider.rerank(query, &candidates).await {
            Ok(ranked) if is_permutation(&candidates, &ranked) => ranked,
            Ok(ranked) => {
                tracing::warn!(
                    target: TRACING_TARGET_RERANK,
                    returned = ranked.len(),
                    "Reranker did not return a reordering of the candidates, keeping retrieval order"
                );
                candidates
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_RERANK,
                    error = %error,
                    "Reranking failed, keeping retrieval order"
                );
                candidates
            }
        }
    }
}
