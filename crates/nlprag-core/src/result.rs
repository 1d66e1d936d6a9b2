//! Pipeline results as returned to callers and stored in the cache.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{TaskId, TaskKind, TaskOutput};

/// Inference output enriched with reranked related documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    #[serde(flatten)]
    pub output: TaskOutput,
    #[serde(default)]
    pub related_docs: Vec<String>,
}

impl InferenceResult {
    /// Creates a result with the given related documents.
    pub fn new(output: TaskOutput, related_docs: Vec<String>) -> Self {
        Self {
            output,
            related_docs,
        }
    }

    /// Renders the text persisted to the vector store for this result.
    pub fn index_text(&self, input: &str) -> crate::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{input} -> {json}"))
    }
}

/// Outcome of one item in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Completed(TaskOutput),
    Failed { error: String },
}

impl BatchItem {
    /// Returns whether the item completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Aggregate outcome of a batch request, keyed by input text.
///
/// Duplicate inputs collapse into a single entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_results: BTreeMap<String, BatchItem>,
}

impl BatchResult {
    /// Returns the outcome for an input text.
    pub fn get(&self, text: &str) -> Option<&BatchItem> {
        self.batch_results.get(text)
    }

    /// Returns the number of distinct inputs.
    pub fn len(&self) -> usize {
        self.batch_results.len()
    }

    /// Returns whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.batch_results.is_empty()
    }
}

impl FromIterator<(String, BatchItem)> for BatchResult {
    fn from_iter<T: IntoIterator<Item = (String, BatchItem)>>(iter: T) -> Self {
        Self {
            batch_results: iter.into_iter().collect(),
        }
    }
}

/// Either a single result or a batch aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Batch(BatchResult),
    Single(InferenceResult),
}

/// The record returned to callers and cached under the task identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub task: TaskKind,
    pub result: TaskPayload,
    pub completed_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_docs: Option<Vec<String>>,
}

impl TaskResult {
    /// Creates a completed single-item result.
    pub fn single(task_id: TaskId, task: TaskKind, result: InferenceResult) -> Self {
        Self {
            task_id,
            task,
            related_docs: Some(result.related_docs.clone()),
            result: TaskPayload::Single(result),
            completed_at: Timestamp::now(),
        }
    }

    /// Creates a completed batch result.
    pub fn batch(task_id: TaskId, task: TaskKind, result: BatchResult) -> Self {
        Self {
            task_id,
            task,
            result: TaskPayload::Batch(result),
            completed_at: Timestamp::now(),
            related_docs: None,
        }
    }

    /// Returns the cache key this result is stored under.
    pub fn cache_key(&self) -> String {
        self.task_id.cache_key(self.task)
    }

    /// Returns the single-item result, if this is not a batch.
    pub fn as_single(&self) -> Option<&InferenceResult> {
        match &self.result {
            TaskPayload::Single(result) => Some(result),
            TaskPayload::Batch(_) => None,
        }
    }

    /// Returns the batch aggregate, if this is a batch.
    pub fn as_batch(&self) -> Option<&BatchResult> {
        match &self.result {
            TaskPayload::Batch(batch) => Some(batch),
            TaskPayload::Single(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ClassifyOutput, SummaryOutput};

    fn classify(category: &str) -> TaskOutput {
        TaskOutput::Classify(ClassifyOutput {
            category: category.to_owned(),
            confidence: 0.8,
        })
    }

    #[test]
    fn test_inference_result_is_flat() {
        let result = InferenceResult::new(classify("infectious"), vec!["doc".to_owned()]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"category": "infectious", "confidence": 0.8, "related_docs": ["doc"]})
        );
    }

    #[test]
    fn test_index_text_embeds_result_json() {
        let result = InferenceResult::new(
            TaskOutput::Summary(SummaryOutput {
                summary: "Flu".to_owned(),
            }),
            Vec::new(),
        );
        assert_eq!(
            result.index_text("Patient has flu").unwrap(),
            r#"Patient has flu -> {"summary":"Flu","related_docs":[]}"#
        );
    }

    #[test]
    fn test_batch_items_serialize_as_result_or_error() {
        let batch: BatchResult = [
            ("a".to_owned(), BatchItem::Completed(classify("chronic"))),
            (
                "b".to_owned(),
                BatchItem::Failed {
                    error: "upstream_service (500)".to_owned(),
                },
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({"batch_results": {
                "a": {"category": "chronic", "confidence": 0.8},
                "b": {"error": "upstream_service (500)"},
            }})
        );
    }

    #[test]
    fn test_task_result_roundtrip() {
        let task_id: TaskId = "task_20250101120000_0123abcd".parse().unwrap();
        let single = TaskResult::single(
            task_id.clone(),
            TaskKind::Classify,
            InferenceResult::new(classify("other"), vec!["x".to_owned()]),
        );
        let json = serde_json::to_string(&single).unwrap();
        let back: TaskResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, single);
        assert_eq!(back.cache_key(), "task_20250101120000_0123abcd_classify");

        let batch = TaskResult::batch(task_id, TaskKind::Classify, BatchResult::default());
        let back: TaskResult = serde_json::from_str(&serde_json::to_string(&batch).unwrap()).unwrap();
        assert!(back.as_batch().is_some());
    }
}
