//! Structured outputs produced by the inference oracle.

use serde::{Deserialize, Serialize};

use crate::{Result, TaskKind};

/// Result of a `classify` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOutput {
    pub category: String,
    pub confidence: f64,
}

/// Result of an `extract_entities` task.
///
/// Entities are kept as raw JSON values since the oracle may return plain
/// strings or objects with a type annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitiesOutput {
    pub entities: Vec<serde_json::Value>,
}

/// Result of a `summarize` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary: String,
}

/// Result of a `sentiment` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentOutput {
    pub sentiment: String,
    pub score: f64,
}

/// Task-specific fields of an inference result.
///
/// Serialized without a tag so the wire shape is exactly the record the
/// oracle was asked for, e.g. `{"category": "...", "confidence": 0.9}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Classify(ClassifyOutput),
    Sentiment(SentimentOutput),
    Entities(EntitiesOutput),
    Summary(SummaryOutput),
}

impl TaskOutput {
    /// Parses oracle JSON into the schema of the given task kind.
    ///
    /// Extra fields are ignored, missing or mistyped fields are an error.
    pub fn parse(kind: TaskKind, json: &str) -> Result<Self> {
        let output = match kind {
            TaskKind::Classify => Self::Classify(serde_json::from_str(json)?),
            TaskKind::ExtractEntities => Self::Entities(serde_json::from_str(json)?),
            TaskKind::Summarize => Self::Summary(serde_json::from_str(json)?),
            TaskKind::Sentiment => Self::Sentiment(serde_json::from_str(json)?),
        };

        Ok(output)
    }

    /// Returns the task kind this output belongs to.
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Classify(_) => TaskKind::Classify,
            Self::Entities(_) => TaskKind::ExtractEntities,
            Self::Summary(_) => TaskKind::Summarize,
            Self::Sentiment(_) => TaskKind::Sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify() {
        let output =
            TaskOutput::parse(TaskKind::Classify, r#"{"category":"infectious","confidence":0.92}"#)
                .unwrap();

        assert_eq!(
            output,
            TaskOutput::Classify(ClassifyOutput {
                category: "infectious".to_owned(),
                confidence: 0.92,
            })
        );
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let output = TaskOutput::parse(
            TaskKind::Summarize,
            r#"{"summary":"Short.","language":"en"}"#,
        )
        .unwrap();
        assert_eq!(output.kind(), TaskKind::Summarize);
    }

    #[test]
    fn test_parse_rejects_wrong_schema() {
        assert!(TaskOutput::parse(TaskKind::Sentiment, r#"{"summary":"x"}"#).is_err());
        assert!(TaskOutput::parse(TaskKind::Classify, "not json").is_err());
        assert!(TaskOutput::parse(TaskKind::ExtractEntities, r#"{"entities":"x"}"#).is_err());
    }

    #[test]
    fn test_entities_accept_mixed_values() {
        let output = TaskOutput::parse(
            TaskKind::ExtractEntities,
            r#"{"entities":["fever",{"text":"cough","type":"symptom"}]}"#,
        )
        .unwrap();

        let TaskOutput::Entities(entities) = output else {
            panic!("expected entities output");
        };
        assert_eq!(entities.entities.len(), 2);
    }

    #[test]
    fn test_untagged_roundtrip_keeps_kind() {
        for kind in TaskKind::ALL {
            let json = serde_json::to_string(&kind.fallback_output()).unwrap();
            let back: TaskOutput = serde_json::from_str(&json).unwrap();
            assert_eq!(back.kind(), kind);
        }
    }
}
