use jiff::Timestamp;
use nlprag_core::{ServiceStatus, TaskId, TaskKind};
use serde::{Deserialize, Serialize};

/// Answer to a background submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTask {
    pub task_id: TaskId,
    pub task: TaskKind,
    pub status: String,
}

impl AcceptedTask {
    pub fn new(task_id: TaskId, task: TaskKind) -> Self {
        Self {
            task_id,
            task,
            status: "accepted".to_owned(),
        }
    }
}

/// Number of stored documents in one task collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSize {
    pub collection: String,
    pub points: u64,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: ServiceStatus,
    pub version: String,
    /// Whether background submissions are still accepted.
    pub accepting_jobs: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: Timestamp,
}
