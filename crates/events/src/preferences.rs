//! Preference resolution: global kill-switches, merchant opt-outs, and
//! quiet hours folded into one [`DispatchDecision`].
//!
//! Order of checks:
//! 1. the notification type's global flag,
//! 2. the merchant's flag for that type,
//! 3. the merchant's quiet-hours window (critical types bypass it).
//!
//! Storage failures fail open: an unreadable settings or preference record
//! is treated as "send on both channels" and logged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use courier_core::channels::PreferredChannel;
use courier_core::clock::ReferenceZone;
use courier_core::notification_type::NotificationType;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::GlobalNotificationSettings;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::store::{NotificationStore, StoreResult};

/// Why a notification was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The type is switched off platform-wide.
    GloballyDisabled,
    /// The merchant opted out of this type.
    MerchantDisabled,
    /// The merchant is inside their quiet-hours window.
    QuietHours,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::GloballyDisabled => "globally_disabled",
            SkipReason::MerchantDisabled => "merchant_disabled",
            SkipReason::QuietHours => "quiet_hours",
        }
    }
}

/// Outcome of [`PreferenceResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchDecision {
    pub can_send: bool,
    /// The merchant's preferred channel, reported even when skipping.
    pub channel: PreferredChannel,
    pub skip_reason: Option<SkipReason>,
}

impl DispatchDecision {
    fn send(channel: PreferredChannel) -> Self {
        Self {
            can_send: true,
            channel,
            skip_reason: None,
        }
    }

    fn skip(channel: PreferredChannel, reason: SkipReason) -> Self {
        Self {
            can_send: false,
            channel,
            skip_reason: Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// GlobalSettingsCache
// ---------------------------------------------------------------------------

/// Process-wide cache of the singleton global settings record.
///
/// A cached record is served until `ttl` elapses; the next read reloads it.
/// [`invalidate`](Self::invalidate) drops the cached record immediately and
/// must be called after every update of the settings row. A zero `ttl`
/// disables caching.
pub struct GlobalSettingsCache {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<GlobalNotificationSettings>)>>,
}

impl GlobalSettingsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached record or load a fresh one from `store`.
    pub async fn get(
        &self,
        store: &dyn NotificationStore,
    ) -> StoreResult<Arc<GlobalNotificationSettings>> {
        if let Some((loaded_at, settings)) = self.slot.read().await.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(settings));
            }
        }

        let settings = Arc::new(store.global_settings().await?);
        *self.slot.write().await = Some((Instant::now(), Arc::clone(&settings)));
        Ok(settings)
    }

    /// Store a freshly written record, e.g. the row returned by an update.
    pub async fn replace(&self, settings: GlobalNotificationSettings) {
        *self.slot.write().await = Some((Instant::now(), Arc::new(settings)));
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

// ---------------------------------------------------------------------------
// PreferenceResolver
// ---------------------------------------------------------------------------

pub struct PreferenceResolver {
    store: Arc<dyn NotificationStore>,
    settings: Arc<GlobalSettingsCache>,
    zone: ReferenceZone,
}

impl PreferenceResolver {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        settings: Arc<GlobalSettingsCache>,
        zone: ReferenceZone,
    ) -> Self {
        Self {
            store,
            settings,
            zone,
        }
    }

    pub async fn resolve(
        &self,
        merchant_id: DbId,
        notification_type: NotificationType,
    ) -> DispatchDecision {
        self.resolve_at(merchant_id, notification_type, Utc::now()).await
    }

    /// Resolve against an explicit clock reading.
    pub async fn resolve_at(
        &self,
        merchant_id: DbId,
        notification_type: NotificationType,
        now: Timestamp,
    ) -> DispatchDecision {
        match self.settings.get(self.store.as_ref()).await {
            Ok(settings) if !settings.is_enabled(notification_type) => {
                return DispatchDecision::skip(
                    PreferredChannel::Both,
                    SkipReason::GloballyDisabled,
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Global notification settings unavailable, assuming enabled");
            }
        }

        let preference = match self.store.preference(merchant_id).await {
            Ok(preference) => preference,
            Err(e) => {
                tracing::warn!(
                    merchant_id,
                    error = %e,
                    "Notification preferences unavailable, sending on both channels"
                );
                return DispatchDecision::send(PreferredChannel::Both);
            }
        };
        let channel = preference.channel();

        if !preference.flags().is_enabled(notification_type) {
            return DispatchDecision::skip(channel, SkipReason::MerchantDisabled);
        }

        if !notification_type.is_critical() {
            match preference.quiet_hours() {
                Some(Ok(window)) if window.contains(self.zone.time_of_day(now)) => {
                    return DispatchDecision::skip(channel, SkipReason::QuietHours);
                }
                Some(Err(e)) => {
                    tracing::warn!(merchant_id, error = %e, "Ignoring malformed quiet hours");
                }
                _ => {}
            }
        }

        DispatchDecision::send(channel)
    }
}
