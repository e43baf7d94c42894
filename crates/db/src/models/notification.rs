//! Notification settings, preference, and delivery-log models and DTOs.

use courier_core::channels::PreferredChannel;
use courier_core::delivery::DeliveryStatus;
use courier_core::notification_type::{NotificationType, TypeFlags};
use courier_core::quiet_hours::QuietHours;
use courier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

/// The singleton row of `global_notification_settings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GlobalNotificationSettings {
    pub id: i16,
    pub new_order_enabled: bool,
    pub new_message_enabled: bool,
    pub appointment_enabled: bool,
    pub order_status_enabled: bool,
    pub missed_message_enabled: bool,
    pub disconnect_alert_enabled: bool,
    pub low_stock_enabled: bool,
    pub weekly_digest_enabled: bool,
    /// 0 = Sunday.
    pub weekly_report_day: i16,
    pub weekly_report_time: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GlobalNotificationSettings {
    pub fn flags(&self) -> TypeFlags {
        TypeFlags {
            new_order: self.new_order_enabled,
            new_message: self.new_message_enabled,
            appointment: self.appointment_enabled,
            order_status: self.order_status_enabled,
            missed_message: self.missed_message_enabled,
            disconnect_alert: self.disconnect_alert_enabled,
            low_stock: self.low_stock_enabled,
            weekly_digest: self.weekly_digest_enabled,
        }
    }

    pub fn is_enabled(&self, notification_type: NotificationType) -> bool {
        self.flags().is_enabled(notification_type)
    }
}

/// DTO for updating the global settings. `None` leaves a field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGlobalSettings {
    pub new_order_enabled: Option<bool>,
    pub new_message_enabled: Option<bool>,
    pub appointment_enabled: Option<bool>,
    pub order_status_enabled: Option<bool>,
    pub missed_message_enabled: Option<bool>,
    pub disconnect_alert_enabled: Option<bool>,
    pub low_stock_enabled: Option<bool>,
    pub weekly_digest_enabled: Option<bool>,
    pub weekly_report_day: Option<i16>,
    pub weekly_report_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Merchant preferences
// ---------------------------------------------------------------------------

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub merchant_id: DbId,
    pub new_order_enabled: bool,
    pub new_message_enabled: bool,
    pub appointment_enabled: bool,
    pub order_status_enabled: bool,
    pub missed_message_enabled: bool,
    pub disconnect_alert_enabled: bool,
    pub low_stock_enabled: bool,
    pub weekly_digest_enabled: bool,
    pub preferred_channel: String,
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: String,
    pub quiet_hours_end: String,
    /// Stored for the settings UI; not enforced by the dispatcher.
    pub batching_enabled: bool,
    pub batch_interval_minutes: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    pub fn flags(&self) -> TypeFlags {
        TypeFlags {
            new_order: self.new_order_enabled,
            new_message: self.new_message_enabled,
            appointment: self.appointment_enabled,
            order_status: self.order_status_enabled,
            missed_message: self.missed_message_enabled,
            disconnect_alert: self.disconnect_alert_enabled,
            low_stock: self.low_stock_enabled,
            weekly_digest: self.weekly_digest_enabled,
        }
    }

    /// Preferred channel; unrecognised values fall back to `both`.
    pub fn channel(&self) -> PreferredChannel {
        PreferredChannel::parse(&self.preferred_channel).unwrap_or(PreferredChannel::Both)
    }

    /// The configured window when quiet hours are switched on.
    ///
    /// Returns `Some(Err(_))` when enabled but the stored bounds are malformed.
    pub fn quiet_hours(&self) -> Option<Result<QuietHours, courier_core::error::CoreError>> {
        self.quiet_hours_enabled
            .then(|| QuietHours::parse(&self.quiet_hours_start, &self.quiet_hours_end))
    }
}

/// DTO for updating a merchant's preferences. `None` leaves a field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotificationPreference {
    pub new_order_enabled: Option<bool>,
    pub new_message_enabled: Option<bool>,
    pub appointment_enabled: Option<bool>,
    pub order_status_enabled: Option<bool>,
    pub missed_message_enabled: Option<bool>,
    pub disconnect_alert_enabled: Option<bool>,
    pub low_stock_enabled: Option<bool>,
    pub weekly_digest_enabled: Option<bool>,
    pub preferred_channel: Option<PreferredChannel>,
    pub quiet_hours_enabled: Option<bool>,
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
    pub batching_enabled: Option<bool>,
    pub batch_interval_minutes: Option<i32>,
}

// ---------------------------------------------------------------------------
// Delivery logs
// ---------------------------------------------------------------------------

/// A row from the `notification_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationLog {
    pub id: DbId,
    pub merchant_id: DbId,
    pub notification_type: String,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub status: String,
    pub error: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl NotificationLog {
    pub fn status(&self) -> Option<DeliveryStatus> {
        DeliveryStatus::parse(&self.status)
    }
}

/// Insert DTO for a `pending` notification log row.
#[derive(Debug, Clone)]
pub struct NewNotificationLog {
    pub merchant_id: DbId,
    pub notification_type: NotificationType,
    pub channel: PreferredChannel,
    pub title: String,
    pub body: String,
}

/// A row from the `push_notification_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushNotificationLog {
    pub id: DbId,
    pub notification_log_id: Option<DbId>,
    pub subscription_id: DbId,
    pub merchant_id: DbId,
    pub status: String,
    pub error: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
