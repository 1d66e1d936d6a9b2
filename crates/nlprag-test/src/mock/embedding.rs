//! Mock embedding provider for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use nlprag_core::{EMBEDDING_DIMENSION, Error, Result};
use nlprag_provider::EmbeddingProvider;

#[derive(Debug)]
struct Inner {
    dimension: usize,
    calls: AtomicUsize,
    texts: AtomicUsize,
    failing: AtomicBool,
}

/// Mock embedding provider for testing.
///
/// Produces normalized bag-of-words vectors: every lowercased word is hashed
/// into a bucket, so texts sharing words have a high cosine similarity.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    inner: Arc<Inner>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

impl MockEmbeddingProvider {
    /// Creates a provider returning vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                dimension: dimension.max(1),
                calls: AtomicUsize::new(0),
                texts: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }),
        }
    }

    /// Makes every later call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the number of upstream calls made.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Returns the number of texts embedded.
    pub fn texts(&self) -> usize {
        self.inner.texts.load(Ordering::SeqCst)
    }

    /// Embeds one text deterministically.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.inner.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.inner.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(Error::upstream()
                .with_status(503)
                .with_message("mock embedding failure"));
        }

        self.inner.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}
