//! Delivery status state machine shared by notification and push logs.
//!
//! A log row is written `pending` when a dispatch attempt starts and is
//! completed exactly once, to either `sent` or `failed`. Terminal states
//! have no outgoing transitions.

use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => STATUS_PENDING,
            DeliveryStatus::Sent => STATUS_SENT,
            DeliveryStatus::Failed => STATUS_FAILED,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_PENDING => Some(DeliveryStatus::Pending),
            STATUS_SENT => Some(DeliveryStatus::Sent),
            STATUS_FAILED => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }

    /// Returns the set of statuses reachable from `self`.
    pub fn valid_transitions(self) -> &'static [DeliveryStatus] {
        match self {
            DeliveryStatus::Pending => &[DeliveryStatus::Sent, DeliveryStatus::Failed],
            DeliveryStatus::Sent | DeliveryStatus::Failed => &[],
        }
    }

    pub fn can_transition(self, to: DeliveryStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Status for a finished attempt.
    pub fn from_outcome(succeeded: bool) -> Self {
        if succeeded {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_terminal_state() {
        assert!(DeliveryStatus::Pending.can_transition(DeliveryStatus::Sent));
        assert!(DeliveryStatus::Pending.can_transition(DeliveryStatus::Failed));
    }

    #[test]
    fn sent_never_returns_to_pending() {
        assert!(!DeliveryStatus::Sent.can_transition(DeliveryStatus::Pending));
        assert!(!DeliveryStatus::Sent.can_transition(DeliveryStatus::Failed));
    }

    #[test]
    fn failed_is_terminal() {
        assert!(DeliveryStatus::Failed.is_terminal());
        assert!(DeliveryStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn parse_matches_column_values() {
        assert_eq!(DeliveryStatus::parse("sent"), Some(DeliveryStatus::Sent));
        assert_eq!(DeliveryStatus::parse("queued"), None);
    }
}
