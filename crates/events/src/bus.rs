//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`PlatformEvent`]s. The
//! dispatcher publishes `notification.*` events on it and the webhook
//! ingress publishes `webhook.received` once a request passes verification.
//! It is shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use courier_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A notification was suppressed by policy. Payload carries the reason.
pub const EVENT_NOTIFICATION_SKIPPED: &str = "notification.skipped";

/// Every attempted channel of a dispatch succeeded.
pub const EVENT_NOTIFICATION_SENT: &str = "notification.sent";

/// At least one attempted channel of a dispatch failed.
pub const EVENT_NOTIFICATION_FAILED: &str = "notification.failed";

/// An inbound webhook passed signature verification.
pub const EVENT_WEBHOOK_RECEIVED: &str = "webhook.received";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the engine.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_merchant`](PlatformEvent::with_merchant),
/// [`with_source`](PlatformEvent::with_source), and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"notification.sent"`.
    pub event_type: String,

    /// Tenant the event belongs to, when known.
    pub merchant_id: Option<DbId>,

    /// Optional source entity kind (e.g. `"notification_log"`).
    pub source_entity_type: Option<String>,

    /// Optional source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            merchant_id: None,
            source_entity_type: None,
            source_entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_merchant(mut self, merchant_id: DbId) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use courier_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("notification.sent").with_merchant(7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: PlatformEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
