//! Mock inference provider for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nlprag_core::{Error, Result};
use nlprag_provider::InferenceProvider;
use serde_json::json;

#[derive(Debug, Default)]
struct Inner {
    reply: Option<String>,
    fenced: bool,
    fail_when: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

/// Mock inference provider for testing.
///
/// By default answers every prompt with well-formed JSON for the task the
/// prompt asks for. Clones share state, so a clone handed to a service can
/// still be inspected by the test.
#[derive(Debug, Clone, Default)]
pub struct MockInferenceProvider {
    inner: Arc<Inner>,
}

impl MockInferenceProvider {
    /// Creates a provider answering with task-appropriate JSON.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every prompt with `content` verbatim.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                reply: Some(content.into()),
                ..Inner::default()
            }),
        }
    }

    /// Wraps every answer in a ```` ```json ```` fence.
    pub fn fenced() -> Self {
        Self {
            inner: Arc::new(Inner {
                fenced: true,
                ..Inner::default()
            }),
        }
    }

    /// Fails every prompt containing `needle` with an upstream 500.
    pub fn failing_when(needle: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fail_when: Mutex::new(vec![needle.into()]),
                ..Inner::default()
            }),
        }
    }

    /// Additionally fails every later prompt containing `needle`.
    pub fn fail_when(&self, needle: impl Into<String>) {
        if let Ok(mut needles) = self.inner.fail_when.lock() {
            needles.push(needle.into());
        }
    }

    /// Returns the number of completions requested.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Returns every prompt received, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner
            .prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn answer(prompt: &str) -> serde_json::Value {
        if prompt.starts_with("Classify") {
            json!({"category": "infectious", "confidence": 0.9})
        } else if prompt.starts_with("Extract entities") {
            json!({"entities": ["fever", "cough"]})
        } else if prompt.starts_with("Summarize") {
            json!({"summary": "Short summary."})
        } else {
            json!({"sentiment": "positive", "score": 0.8})
        }
    }
}

#[async_trait::async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.inner.prompts.lock() {
            prompts.push(prompt.to_owned());
        }

        let failing = self
            .inner
            .fail_when
            .lock()
            .is_ok_and(|needles| needles.iter().any(|n| prompt.contains(n.as_str())));
        if failing {
            return Err(Error::upstream()
                .with_status(500)
                .with_message("mock inference failure"));
        }

        let content = match &self.inner.reply {
            Some(reply) => reply.clone(),
            None => Self::answer(prompt).to_string(),
        };

        if self.inner.fenced {
            Ok(format!("```json\n{content}\n```"))
        } else {
            Ok(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use nlprag_core::{ErrorKind, TaskKind, TaskOutput};

    use super::*;

    #[tokio::test]
    async fn test_default_answers_parse_for_every_kind() {
        let provider = MockInferenceProvider::new();
        for kind in TaskKind::ALL {
            let content = provider.complete(&kind.prompt("text", &[])).await.unwrap();
            let output = TaskOutput::parse(kind, &content).unwrap();
            assert_eq!(output.kind(), kind);
        }
        assert_eq!(provider.calls(), TaskKind::ALL.len());
    }

    #[tokio::test]
    async fn test_failing_prompts() {
        let provider = MockInferenceProvider::failing_when("boom");
        let err = provider.complete("Summarize 'boom'.").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamService);
        assert!(provider.complete("Summarize 'fine'.").await.is_ok());
        assert_eq!(provider.prompts().len(), 2);
    }
}
