//! Multi-channel notification dispatch.
//!
//! One call to [`Dispatcher::dispatch`] resolves preferences, writes one
//! `pending` notification log row, fans out to every active push
//! subscription and the merchant's notification email in parallel, and
//! finalises the row once all attempts have finished.
//!
//! A dispatch is `sent` only when every *attempted* channel succeeded. The
//! push channel succeeds when at least one subscription accepted the
//! message. A channel with nothing to deliver to (no subscriptions, no email
//! on file, no transport configured) is not attempted and does not count as
//! a failure. Suppressed notifications write no log row; they are published
//! as `notification.skipped` events instead.

use std::sync::Arc;

use chrono::Utc;
use courier_core::channels::PreferredChannel;
use courier_core::clock::ReferenceZone;
use courier_core::notification_type::NotificationType;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::NewNotificationLog;
use courier_db::models::push_subscription::PushSubscription;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::bus::{
    EventBus, PlatformEvent, EVENT_NOTIFICATION_FAILED, EVENT_NOTIFICATION_SENT,
    EVENT_NOTIFICATION_SKIPPED,
};
use crate::delivery::{EmailMessage, EmailSender, PushAction, PushMessage, PushSender};
use crate::delivery_log::{DeliveryLogger, PendingDelivery};
use crate::preferences::{GlobalSettingsCache, PreferenceResolver, SkipReason};
use crate::store::NotificationStore;

/// A business event to notify a merchant about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub merchant_id: DbId,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    /// Where a click on the notification should lead.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NotificationPayload {
    pub fn new(
        merchant_id: DbId,
        notification_type: NotificationType,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id,
            notification_type,
            title: title.into(),
            body: body.into(),
            url: None,
            metadata: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// What happened on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult {
    /// The resolved channel did not include this one.
    NotRequested,
    /// Requested, but there was nothing to deliver to.
    NotAttempted,
    Succeeded,
    Failed(String),
}

impl ChannelResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ChannelResult::Failed(_))
    }

    fn error(&self) -> Option<&str> {
        match self {
            ChannelResult::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Detailed result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Skipped {
        reason: SkipReason,
        channel: PreferredChannel,
    },
    Completed {
        /// `None` if the pending log row could not be written.
        log_id: Option<DbId>,
        channel: PreferredChannel,
        push: ChannelResult,
        email: ChannelResult,
    },
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        match self {
            DispatchOutcome::Skipped { .. } => false,
            DispatchOutcome::Completed { push, email, .. } => {
                !push.is_failure() && !email.is_failure()
            }
        }
    }

    /// Concatenated per-channel errors, if any channel failed.
    pub fn error_summary(&self) -> Option<String> {
        let DispatchOutcome::Completed { push, email, .. } = self else {
            return None;
        };
        let errors: Vec<String> = [("push", push.error()), ("email", email.error())]
            .into_iter()
            .filter_map(|(name, e)| e.map(|e| format!("{name}: {e}")))
            .collect();
        (!errors.is_empty()).then(|| errors.join(" | "))
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    store: Arc<dyn NotificationStore>,
    resolver: PreferenceResolver,
    logger: DeliveryLogger,
    push: Option<Arc<dyn PushSender>>,
    email: Option<Arc<dyn EmailSender>>,
    bus: Arc<EventBus>,
}

impl Dispatcher {
    /// A dispatcher with no transports. Attach them with
    /// [`with_push`](Self::with_push) and [`with_email`](Self::with_email).
    pub fn new(
        store: Arc<dyn NotificationStore>,
        settings: Arc<GlobalSettingsCache>,
        zone: ReferenceZone,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            resolver: PreferenceResolver::new(Arc::clone(&store), settings, zone),
            logger: DeliveryLogger::new(Arc::clone(&store)),
            store,
            push: None,
            email: None,
            bus,
        }
    }

    pub fn with_push(mut self, sender: Arc<dyn PushSender>) -> Self {
        self.push = Some(sender);
        self
    }

    pub fn with_email(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn resolver(&self) -> &PreferenceResolver {
        &self.resolver
    }

    /// Dispatch and report only whether the notification was sent.
    pub async fn dispatch(&self, payload: &NotificationPayload) -> bool {
        self.dispatch_detailed(payload).await.succeeded()
    }

    pub async fn dispatch_detailed(&self, payload: &NotificationPayload) -> DispatchOutcome {
        self.dispatch_at(payload, Utc::now()).await
    }

    /// Dispatch against an explicit clock reading (used for quiet hours).
    pub async fn dispatch_at(
        &self,
        payload: &NotificationPayload,
        now: Timestamp,
    ) -> DispatchOutcome {
        let merchant_id = payload.merchant_id;
        let decision = self
            .resolver
            .resolve_at(merchant_id, payload.notification_type, now)
            .await;

        if let Some(reason) = decision.skip_reason {
            tracing::debug!(
                merchant_id,
                notification_type = %payload.notification_type,
                reason = reason.as_str(),
                "Notification skipped"
            );
            self.bus.publish(
                PlatformEvent::new(EVENT_NOTIFICATION_SKIPPED)
                    .with_merchant(merchant_id)
                    .with_payload(serde_json::json!({
                        "notification_type": payload.notification_type,
                        "reason": reason,
                    })),
            );
            return DispatchOutcome::Skipped {
                reason,
                channel: decision.channel,
            };
        }

        let channel = decision.channel;
        let entry = NewNotificationLog {
            merchant_id,
            notification_type: payload.notification_type,
            channel,
            title: payload.title.clone(),
            body: payload.body.clone(),
        };
        let pending = match self.logger.begin(&entry).await {
            Ok(pending) => Some(pending),
            Err(e) => {
                tracing::error!(merchant_id, error = %e, "Failed to create notification log");
                None
            }
        };

        let push_attempt = async {
            if channel.includes_push() {
                self.deliver_push(payload, pending.as_ref()).await
            } else {
                ChannelResult::NotRequested
            }
        };
        let email_attempt = async {
            if channel.includes_email() {
                self.deliver_email(payload).await
            } else {
                ChannelResult::NotRequested
            }
        };
        let (push, email) = tokio::join!(push_attempt, email_attempt);

        let outcome = DispatchOutcome::Completed {
            log_id: pending.as_ref().map(PendingDelivery::log_id),
            channel,
            push,
            email,
        };
        let succeeded = outcome.succeeded();
        let error = outcome.error_summary();

        if let Some(pending) = pending {
            if let Err(e) = self
                .logger
                .complete(pending, succeeded, error.as_deref())
                .await
            {
                tracing::error!(merchant_id, error = %e, "Failed to complete notification log");
            }
        }

        let event_type = if succeeded {
            tracing::info!(
                merchant_id,
                notification_type = %payload.notification_type,
                channel = channel.as_str(),
                "Notification sent"
            );
            EVENT_NOTIFICATION_SENT
        } else {
            tracing::warn!(
                merchant_id,
                notification_type = %payload.notification_type,
                error = error.as_deref().unwrap_or_default(),
                "Notification failed"
            );
            EVENT_NOTIFICATION_FAILED
        };
        let mut event = PlatformEvent::new(event_type)
            .with_merchant(merchant_id)
            .with_payload(serde_json::json!({
                "notification_type": payload.notification_type,
                "channel": channel,
                "error": error,
            }));
        if let DispatchOutcome::Completed {
            log_id: Some(log_id),
            ..
        } = &outcome
        {
            event = event.with_source("notification_log", *log_id);
        }
        self.bus.publish(event);

        outcome
    }

    async fn deliver_push(
        &self,
        payload: &NotificationPayload,
        pending: Option<&PendingDelivery>,
    ) -> ChannelResult {
        let Some(sender) = &self.push else {
            tracing::debug!(merchant_id = payload.merchant_id, "Push transport not configured");
            return ChannelResult::NotAttempted;
        };

        let subscriptions = match self
            .store
            .active_push_subscriptions(payload.merchant_id)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(e) => return ChannelResult::Failed(format!("subscriptions unavailable: {e}")),
        };
        if subscriptions.is_empty() {
            return ChannelResult::NotAttempted;
        }

        let message = push_message(payload);
        let attempts = subscriptions.iter().map(|subscription| {
            self.push_one(sender.as_ref(), subscription, &message, pending)
        });
        let results = join_all(attempts).await;

        if results.iter().any(Result::is_ok) {
            ChannelResult::Succeeded
        } else {
            let errors: Vec<String> = results.into_iter().filter_map(Result::err).collect();
            ChannelResult::Failed(errors.join("; "))
        }
    }

    async fn push_one(
        &self,
        sender: &dyn PushSender,
        subscription: &PushSubscription,
        message: &PushMessage,
        pending: Option<&PendingDelivery>,
    ) -> Result<(), String> {
        let merchant_id = subscription.merchant_id;
        match sender.send(subscription, message).await {
            Ok(()) => {
                self.logger
                    .record_push_attempt(pending, subscription.id, merchant_id, true, None)
                    .await;
                Ok(())
            }
            Err(e) => {
                let error = e.to_string();
                if e.is_gone() {
                    match self.store.deactivate_push_subscription(subscription.id).await {
                        Ok(_) => tracing::info!(
                            subscription_id = subscription.id,
                            "Deactivated gone push subscription"
                        ),
                        Err(db_err) => tracing::error!(
                            subscription_id = subscription.id,
                            error = %db_err,
                            "Failed to deactivate push subscription"
                        ),
                    }
                } else {
                    tracing::warn!(subscription_id = subscription.id, error = %e, "Push attempt failed");
                }
                self.logger
                    .record_push_attempt(pending, subscription.id, merchant_id, false, Some(&error))
                    .await;
                Err(format!("subscription {}: {error}", subscription.id))
            }
        }
    }

    async fn deliver_email(&self, payload: &NotificationPayload) -> ChannelResult {
        let Some(sender) = &self.email else {
            tracing::debug!(merchant_id = payload.merchant_id, "Email transport not configured");
            return ChannelResult::NotAttempted;
        };

        let to = match self.store.notification_email(payload.merchant_id).await {
            Ok(Some(to)) => to,
            Ok(None) => return ChannelResult::NotAttempted,
            Err(e) => return ChannelResult::Failed(format!("email address unavailable: {e}")),
        };

        match sender.send(&email_message(payload, to)).await {
            Ok(()) => ChannelResult::Succeeded,
            Err(e) => ChannelResult::Failed(e.to_string()),
        }
    }
}

fn push_message(payload: &NotificationPayload) -> PushMessage {
    PushMessage {
        title: payload.title.clone(),
        body: payload.body.clone(),
        url: payload.url.clone().unwrap_or_else(|| "/".to_string()),
        tag: payload.notification_type.as_str().to_string(),
        require_interaction: payload.notification_type.is_critical(),
        actions: vec![PushAction {
            action: "open".to_string(),
            title: "View".to_string(),
        }],
        data: payload.metadata.clone(),
    }
}

fn email_message(payload: &NotificationPayload, to: String) -> EmailMessage {
    let title = html_escape::encode_text(&payload.title);
    let body = html_escape::encode_text(&payload.body);
    let mut html = format!("<h2>{title}</h2><p>{body}</p>");
    let mut text = format!("{}\n\n{}\n", payload.title, payload.body);
    if let Some(url) = &payload.url {
        let href = html_escape::encode_double_quoted_attribute(url);
        html.push_str(&format!("<p><a href=\"{href}\">View</a></p>"));
        text.push_str(&format!("\n{url}\n"));
    }

    EmailMessage {
        to,
        subject: payload.title.clone(),
        html,
        text: Some(text),
    }
}
