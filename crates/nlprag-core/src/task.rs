//! Task kinds and per-submission task identity.

use std::str::FromStr;

use derive_more::{Deref, Display};
use jiff::Zoned;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::output::{
    ClassifyOutput, EntitiesOutput, SentimentOutput, SummaryOutput, TaskOutput,
};
use crate::{Error, Result};

/// The NLP operation requested by a caller.
///
/// The kind selects both the prompt template sent to the inference oracle
/// and the vector collection used for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRefStr, IntoStaticStr, EnumString, EnumIter)]
#[derive(strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskKind {
    /// Classify the text into one of the supplied categories.
    Classify,
    /// Extract named entities.
    ExtractEntities,
    /// Summarize the text.
    Summarize,
    /// Determine the sentiment of the text.
    Sentiment,
}

impl TaskKind {
    /// Every supported task kind, in collection creation order.
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Classify,
        TaskKind::ExtractEntities,
        TaskKind::Summarize,
        TaskKind::Sentiment,
    ];

    /// Returns the name of the vector collection backing this kind.
    pub fn collection_name(self) -> &'static str {
        self.into()
    }

    /// Returns whether category hints are meaningful for this kind.
    pub fn uses_categories(self) -> bool {
        matches!(self, TaskKind::Classify)
    }

    /// Renders the inference prompt for the given text.
    ///
    /// Categories are only interpolated for [`TaskKind::Classify`].
    pub fn prompt(self, text: &str, categories: &[String]) -> String {
        match self {
            TaskKind::Classify => {
                let categories = serde_json::to_string(categories).unwrap_or_default();
                format!(
                    "Classify '{text}' as a medical condition into {categories}. \
                     Return JSON with 'category' and 'confidence' (0-1)."
                )
            }
            TaskKind::ExtractEntities => {
                format!("Extract entities from '{text}'. Return JSON with 'entities' as a list.")
            }
            TaskKind::Summarize => format!("Summarize '{text}'. Return JSON with 'summary'."),
            TaskKind::Sentiment => format!(
                "Determine the sentiment of '{text}'. Return JSON with 'sentiment' \
                 ('positive', 'negative', 'neutral') and 'score' (0-1)."
            ),
        }
    }

    /// Returns the stub result substituted when the oracle output is unusable.
    pub fn fallback_output(self) -> TaskOutput {
        match self {
            TaskKind::Classify => TaskOutput::Classify(ClassifyOutput {
                category: "unknown".to_owned(),
                confidence: 0.5,
            }),
            TaskKind::ExtractEntities => TaskOutput::Entities(EntitiesOutput {
                entities: Vec::new(),
            }),
            TaskKind::Summarize => TaskOutput::Summary(SummaryOutput {
                summary: "No summary available".to_owned(),
            }),
            TaskKind::Sentiment => TaskOutput::Sentiment(SentimentOutput {
                sentiment: "neutral".to_owned(),
                score: 0.5,
            }),
        }
    }
}

/// Identity of a single submission.
///
/// Derived from the submission time plus a random suffix, never from the
/// request content: two identical requests get two distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh identity such as `task_20250114093012_5f0c2a9e`.
    pub fn generate() -> Self {
        let stamp = Zoned::now().strftime("%Y%m%d%H%M%S").to_string();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("task_{stamp}_{}", &suffix[..8]))
    }

    /// Returns the cache key for this submission and task kind.
    pub fn cache_key(&self, kind: TaskKind) -> String {
        format!("{}_{}", self.0, kind)
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.starts_with("task_")
            && s.len() <= 64
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(Error::invalid_input().with_message(format!("malformed task id: {s}")))
        }
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_collection_names_match_wire_names() {
        let names: Vec<_> = TaskKind::iter().map(TaskKind::collection_name).collect();
        assert_eq!(
            names,
            ["classify", "extract_entities", "summarize", "sentiment"]
        );
        assert_eq!(
            serde_json::to_string(&TaskKind::ExtractEntities).unwrap(),
            "\"extract_entities\""
        );
        assert_eq!("sentiment".parse::<TaskKind>().unwrap(), TaskKind::Sentiment);
    }

    #[test]
    fn test_classify_prompt_lists_categories() {
        let categories = vec!["infectious".to_owned(), "chronic".to_owned()];
        let prompt = TaskKind::Classify.prompt("Patient has fever", &categories);
        assert!(prompt.starts_with("Classify 'Patient has fever' as a medical condition"));
        assert!(prompt.contains(r#"["infectious","chronic"]"#));
        assert!(prompt.contains("'category' and 'confidence'"));
    }

    #[test]
    fn test_non_classify_prompt_ignores_categories() {
        let categories = vec!["infectious".to_owned()];
        let prompt = TaskKind::Summarize.prompt("Long text", &categories);
        assert_eq!(prompt, "Summarize 'Long text'. Return JSON with 'summary'.");
    }

    #[test]
    fn test_fallback_outputs_match_kind() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.fallback_output().kind(), kind);
        }
        assert_eq!(
            serde_json::to_value(TaskKind::Classify.fallback_output()).unwrap(),
            serde_json::json!({"category": "unknown", "confidence": 0.5})
        );
    }

    #[test]
    fn test_task_id_format() {
        let id = TaskId::generate();
        assert!(id.starts_with("task_"));
        assert_eq!(id.len(), "task_".len() + 14 + 1 + 8);
        assert_eq!(id.as_str().parse::<TaskId>().unwrap(), id);
    }

    #[test]
    fn test_task_ids_are_unique_within_a_second() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_key_combines_id_and_kind() {
        let id: TaskId = "task_20250101120000_abcdef01".parse().unwrap();
        assert_eq!(
            id.cache_key(TaskKind::Classify),
            "task_20250101120000_abcdef01_classify"
        );
    }

    #[test]
    fn test_rejects_malformed_task_id() {
        assert!("../etc/passwd".parse::<TaskId>().is_err());
        assert!("task_with-dash".parse::<TaskId>().is_err());
        assert!(serde_json::from_str::<TaskId>("\"bogus\"").is_err());
    }
}
