//! Delivery channel names.
//!
//! The string constants must match the values stored in the
//! `notification_preferences.preferred_channel`, `notification_logs.channel`
//! and `scheduled_reports.delivery_method` columns.

use serde::{Deserialize, Serialize};

/// Browser / device push delivered through per-device subscriptions.
pub const CHANNEL_PUSH: &str = "push";

/// Email delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// Push and email together.
pub const CHANNEL_BOTH: &str = "both";

/// Plain-text message on the merchant's chat platform (reports only).
pub const CHANNEL_MESSAGING: &str = "messaging";

// ---------------------------------------------------------------------------
// PreferredChannel
// ---------------------------------------------------------------------------

/// The channel(s) a merchant wants notifications delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredChannel {
    Push,
    Email,
    Both,
}

impl PreferredChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferredChannel::Push => CHANNEL_PUSH,
            PreferredChannel::Email => CHANNEL_EMAIL,
            PreferredChannel::Both => CHANNEL_BOTH,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            CHANNEL_PUSH => Some(PreferredChannel::Push),
            CHANNEL_EMAIL => Some(PreferredChannel::Email),
            CHANNEL_BOTH => Some(PreferredChannel::Both),
            _ => None,
        }
    }

    pub fn includes_push(self) -> bool {
        matches!(self, PreferredChannel::Push | PreferredChannel::Both)
    }

    pub fn includes_email(self) -> bool {
        matches!(self, PreferredChannel::Email | PreferredChannel::Both)
    }
}

// ---------------------------------------------------------------------------
// ReportDeliveryMethod
// ---------------------------------------------------------------------------

/// How a scheduled report is delivered.
///
/// Unlike [`PreferredChannel`], a report configured for `Both` counts as
/// sent when *either* channel succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportDeliveryMethod {
    Email,
    Messaging,
    Both,
}

impl ReportDeliveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportDeliveryMethod::Email => CHANNEL_EMAIL,
            ReportDeliveryMethod::Messaging => CHANNEL_MESSAGING,
            ReportDeliveryMethod::Both => CHANNEL_BOTH,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            CHANNEL_EMAIL => Some(ReportDeliveryMethod::Email),
            CHANNEL_MESSAGING => Some(ReportDeliveryMethod::Messaging),
            CHANNEL_BOTH => Some(ReportDeliveryMethod::Both),
            _ => None,
        }
    }

    pub fn includes_email(self) -> bool {
        matches!(self, ReportDeliveryMethod::Email | ReportDeliveryMethod::Both)
    }

    pub fn includes_messaging(self) -> bool {
        matches!(
            self,
            ReportDeliveryMethod::Messaging | ReportDeliveryMethod::Both
        )
    }
}
