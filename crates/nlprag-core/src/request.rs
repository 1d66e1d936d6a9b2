//! Inference requests submitted to the pipeline.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, TaskKind};

/// Categories offered to the classifier when the caller supplies none.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["infectious", "chronic", "other"];

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| (*c).to_owned()).collect()
}

/// A single submission to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Input text for single-item processing.
    #[serde(default)]
    pub text: String,
    /// Requested operation.
    pub task: TaskKind,
    /// Category hints, only meaningful for [`TaskKind::Classify`].
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Texts to process together in batch mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<Vec<String>>,
    /// Endpoint notified with the finished result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl InferenceRequest {
    /// Creates a single-item request with default categories.
    pub fn new(text: impl Into<String>, task: TaskKind) -> Self {
        Self {
            text: text.into(),
            task,
            categories: default_categories(),
            batch: None,
            webhook_url: None,
        }
    }

    /// Creates a batch request over the given texts.
    pub fn batch<I, S>(task: TaskKind, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batch: Some(texts.into_iter().map(Into::into).collect()),
            ..Self::new(String::new(), task)
        }
    }

    /// Replaces the category hints.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the notification endpoint.
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Returns whether the request should run in batch mode.
    pub fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Returns the categories passed to the prompt, empty unless classifying.
    pub fn prompt_categories(&self) -> &[String] {
        if self.task.uses_categories() {
            &self.categories
        } else {
            &[]
        }
    }

    /// Returns the category used to filter retrieval, if any.
    ///
    /// Only the first category of a `classify` request is used.
    pub fn category_hint(&self) -> Option<&str> {
        self.prompt_categories()
            .first()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Renders the inference prompt for an arbitrary input text.
    pub fn prompt_for(&self, text: &str) -> String {
        self.task.prompt(text, self.prompt_categories())
    }

    /// Checks that the request carries something to process.
    pub fn validate(&self) -> Result<()> {
        match &self.batch {
            Some(batch) if batch.is_empty() => {
                Err(Error::invalid_input().with_message("batch must contain at least one text"))
            }
            Some(batch) if batch.iter().any(|t| t.trim().is_empty()) => {
                Err(Error::invalid_input().with_message("batch texts must not be empty"))
            }
            Some(_) => Ok(()),
            None if self.text.trim().is_empty() => {
                Err(Error::invalid_input().with_message("text must not be empty"))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_deserialize_applies_defaults() {
        let request: InferenceRequest =
            serde_json::from_str(r#"{"text":"Patient has fever","task":"classify"}"#).unwrap();

        assert_eq!(request.categories, ["infectious", "chronic", "other"]);
        assert!(request.batch.is_none());
        assert!(request.webhook_url.is_none());
        assert_eq!(request.category_hint(), Some("infectious"));
    }

    #[test]
    fn test_category_hint_only_for_classify() {
        let request = InferenceRequest::new("text", TaskKind::Sentiment);
        assert_eq!(request.category_hint(), None);
        assert!(request.prompt_categories().is_empty());

        let request = InferenceRequest::new("text", TaskKind::Classify).with_categories(["chronic"]);
        assert_eq!(request.category_hint(), Some("chronic"));

        let request =
            InferenceRequest::new("text", TaskKind::Classify).with_categories(Vec::<String>::new());
        assert_eq!(request.category_hint(), None);
    }

    #[test]
    fn test_validate() {
        assert!(InferenceRequest::new("ok", TaskKind::Summarize).validate().is_ok());

        let err = InferenceRequest::new("  ", TaskKind::Summarize)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let empty_batch = InferenceRequest::batch(TaskKind::Classify, Vec::<String>::new());
        assert!(empty_batch.validate().is_err());

        let batch = InferenceRequest::batch(TaskKind::Classify, ["a", "b"]);
        assert!(batch.is_batch());
        assert!(batch.validate().is_ok());
    }
}
