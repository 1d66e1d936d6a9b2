//! What the notification sink answered.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Receipt of one delivery attempt that reached the sink.
///
/// Transport failures never produce a receipt; they are errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub request_id: Uuid,
    pub status_code: u16,
    /// Time from sending until the status line arrived.
    pub elapsed: SignedDuration,
}

impl WebhookResponse {
    /// Records the answer to a request sent at `sent_at`.
    pub fn new(request_id: Uuid, status_code: u16, sent_at: Timestamp) -> Self {
        Self {
            request_id,
            status_code,
            elapsed: Timestamp::now().duration_since(sent_at),
        }
    }

    /// Only 2xx counts as accepted; redirects are not followed.
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, 200..=299)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let sent_at = Timestamp::now();
        let receipt = |status| WebhookResponse::new(Uuid::new_v4(), status, sent_at);

        assert!(receipt(200).is_success());
        assert!(receipt(204).is_success());
        assert!(!receipt(302).is_success());
        assert!(!receipt(500).is_success());
        assert!(!receipt(500).elapsed.is_negative());
    }
}
