//! Notification types and the enum-keyed enable-flag table.
//!
//! Every per-type map in the system (global kill-switches, per-merchant
//! opt-ins, the quiet-hours critical allowlist) is keyed by
//! [`NotificationType`]. Adding a variant forces every `match` below to be
//! updated, so no map can silently miss a type.

use serde::{Deserialize, Serialize};

/// A business event that may produce an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewOrder,
    NewMessage,
    Appointment,
    OrderStatus,
    MissedMessage,
    DisconnectAlert,
    LowStock,
    WeeklyDigest,
}

impl NotificationType {
    /// Every notification type, in declaration order.
    pub const ALL: [NotificationType; 8] = [
        NotificationType::NewOrder,
        NotificationType::NewMessage,
        NotificationType::Appointment,
        NotificationType::OrderStatus,
        NotificationType::MissedMessage,
        NotificationType::DisconnectAlert,
        NotificationType::LowStock,
        NotificationType::WeeklyDigest,
    ];

    /// Stable wire / column name.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::NewOrder => "new_order",
            NotificationType::NewMessage => "new_message",
            NotificationType::Appointment => "appointment",
            NotificationType::OrderStatus => "order_status",
            NotificationType::MissedMessage => "missed_message",
            NotificationType::DisconnectAlert => "disconnect_alert",
            NotificationType::LowStock => "low_stock",
            NotificationType::WeeklyDigest => "weekly_digest",
        }
    }

    /// Parse a wire name produced by [`as_str`](Self::as_str).
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Whether this type bypasses quiet hours.
    pub fn is_critical(self) -> bool {
        match self {
            NotificationType::DisconnectAlert => true,
            NotificationType::NewOrder
            | NotificationType::NewMessage
            | NotificationType::Appointment
            | NotificationType::OrderStatus
            | NotificationType::MissedMessage
            | NotificationType::LowStock
            | NotificationType::WeeklyDigest => false,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TypeFlags
// ---------------------------------------------------------------------------

/// One enable flag per [`NotificationType`].
///
/// Used both for the process-wide kill-switches and for per-merchant
/// opt-in/opt-out. Defaults to everything enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFlags {
    pub new_order: bool,
    pub new_message: bool,
    pub appointment: bool,
    pub order_status: bool,
    pub missed_message: bool,
    pub disconnect_alert: bool,
    pub low_stock: bool,
    pub weekly_digest: bool,
}

impl TypeFlags {
    pub const fn all_enabled() -> Self {
        Self {
            new_order: true,
            new_message: true,
            appointment: true,
            order_status: true,
            missed_message: true,
            disconnect_alert: true,
            low_stock: true,
            weekly_digest: true,
        }
    }

    pub fn is_enabled(&self, notification_type: NotificationType) -> bool {
        match notification_type {
            NotificationType::NewOrder => self.new_order,
            NotificationType::NewMessage => self.new_message,
            NotificationType::Appointment => self.appointment,
            NotificationType::OrderStatus => self.order_status,
            NotificationType::MissedMessage => self.missed_message,
            NotificationType::DisconnectAlert => self.disconnect_alert,
            NotificationType::LowStock => self.low_stock,
            NotificationType::WeeklyDigest => self.weekly_digest,
        }
    }

    pub fn set(&mut self, notification_type: NotificationType, enabled: bool) {
        let slot = match notification_type {
            NotificationType::NewOrder => &mut self.new_order,
            NotificationType::NewMessage => &mut self.new_message,
            NotificationType::Appointment => &mut self.appointment,
            NotificationType::OrderStatus => &mut self.order_status,
            NotificationType::MissedMessage => &mut self.missed_message,
            NotificationType::DisconnectAlert => &mut self.disconnect_alert,
            NotificationType::LowStock => &mut self.low_stock,
            NotificationType::WeeklyDigest => &mut self.weekly_digest,
        };
        *slot = enabled;
    }
}

impl Default for TypeFlags {
    fn default() -> Self {
        Self::all_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for t in NotificationType::ALL {
            assert_eq!(NotificationType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn parse_rejects_unknown_name() {
        assert_eq!(NotificationType::parse("newsletter"), None);
    }

    #[test]
    fn only_disconnect_alert_is_critical() {
        let critical: Vec<_> = NotificationType::ALL
            .into_iter()
            .filter(|t| t.is_critical())
            .collect();
        assert_eq!(critical, vec![NotificationType::DisconnectAlert]);
    }

    #[test]
    fn default_flags_enable_everything() {
        let flags = TypeFlags::default();
        assert!(NotificationType::ALL.into_iter().all(|t| flags.is_enabled(t)));
    }

    #[test]
    fn set_only_touches_the_named_type() {
        let mut flags = TypeFlags::default();
        flags.set(NotificationType::LowStock, false);

        for t in NotificationType::ALL {
            assert_eq!(flags.is_enabled(t), t != NotificationType::LowStock);
        }
    }
}
