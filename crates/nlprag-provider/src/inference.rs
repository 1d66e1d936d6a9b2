//! Inference (chat completion) service.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use nlprag_core::{Error, Result, TaskKind};
use serde::{Deserialize, Serialize};

use crate::{HttpClient, TRACING_TARGET_INFERENCE};

/// Sampling temperature sent with every completion request.
const TEMPERATURE: f32 = 0.1;

/// Completion length cap sent with every completion request.
const MAX_TOKENS: u32 = 1024;

/// A service that turns a prompt into model-generated text.
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Returns the raw text content produced for `prompt`.
    ///
    /// Empty content is a [`DataShape`] error.
    ///
    /// [`DataShape`]: nlprag_core::ErrorKind::DataShape
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    stream: bool,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

/// Chat completion client for the inference service.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: HttpClient,
}

impl ChatCompletionClient {
    /// Creates a chat completion client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Converts this client into an [`InferenceService`].
    pub fn into_service(self) -> InferenceService {
        InferenceService::new(self)
    }
}

#[async_trait::async_trait]
impl InferenceProvider for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let config = self.client.config();
        let request = ChatRequest {
            model: &config.chat_model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            stream: false,
            max_tokens: MAX_TOKENS,
        };

        let response: ChatResponse = self
            .client
            .post_json(&config.chat_base_url, "chat/completions", &request)
            .await?;

        response.into_content().ok_or_else(|| {
            Error::data_shape().with_message("inference service returned empty content")
        })
    }
}

/// Inference service with observability.
#[derive(Clone)]
pub struct InferenceService {
    provider: Arc<dyn InferenceProvider>,
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService").finish_non_exhaustive()
    }
}

impl InferenceService {
    /// Creates a new inference service from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: InferenceProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Runs a single completion for a task prompt. No retries are attempted.
    pub async fn complete(&self, kind: TaskKind, prompt: &str) -> Result<String> {
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET_INFERENCE,
            task = %kind,
            prompt_len = prompt.len(),
            "Processing inference request"
        );

        let result = self.provider.complete(prompt).await;
        let elapsed = Timestamp::now().duration_since(started_at);

        match &result {
            Ok(content) => {
                tracing::debug!(
                    target: TRACING_TARGET_INFERENCE,
                    task = %kind,
                    content_len = content.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Inference completed"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_INFERENCE,
                    task = %kind,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Inference failed"
                );
            }
        }

        result
    }
}
