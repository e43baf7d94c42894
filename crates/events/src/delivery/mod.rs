//! Channel transports.
//!
//! Each transport is a trait so the dispatcher and report engine can be
//! driven against fakes. The concrete implementations are:
//!
//! - [`SmtpEmailSender`]: SMTP via `lettre`.
//! - [`HttpPushSender`]: an HTTP web-push gateway via `reqwest`.
//! - [`HttpMessageSender`]: an HTTP chat-messaging gateway via `reqwest`.

use async_trait::async_trait;
use courier_db::models::push_subscription::PushSubscription;
use serde::Serialize;

pub mod email;
pub mod messaging;
pub mod push;

pub use email::{EmailConfig, EmailError, SmtpEmailSender};
pub use messaging::{HttpMessageSender, MessagingConfig, MessagingError};
pub use push::{HttpPushSender, PushConfig, PushError};

/// One outbound email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// A clickable action shown on a push notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushAction {
    pub action: String,
    pub title: String,
}

/// The notification body sent to every push subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
    /// Collapses notifications of the same kind on the device.
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<PushAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver to one subscription. [`PushError::Gone`] means the endpoint
    /// is permanently unreachable and should be deactivated.
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError>;
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a plain-text chat message to a phone number.
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MessagingError>;
}
