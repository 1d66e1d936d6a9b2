//! Health states reported by the service and its collaborators.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Whether a component can do its work.
///
/// Variants are ordered from best to worst.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Healthy,
    /// Serving, with reduced result quality or capacity.
    Degraded,
    Unhealthy,
}

impl ServiceStatus {
    /// Returns the worse of two statuses.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Point-in-time health of one collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: Timestamp,
}

impl ServiceHealth {
    /// Healthy as of now.
    pub fn healthy() -> Self {
        Self {
            status: ServiceStatus::Healthy,
            message: None,
            checked_at: Timestamp::now(),
        }
    }

    /// Degraded as of now, with the reason.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Degraded,
            message: Some(message.into()),
            checked_at: Timestamp::now(),
        }
    }
}
