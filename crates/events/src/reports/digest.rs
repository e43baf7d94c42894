//! Weekly digest notification.
//!
//! Once a week, at the global `weekly_report_day` / `weekly_report_time` in
//! the reference zone, every active merchant gets a `weekly_digest`
//! notification summarising the trailing seven days. It goes through the
//! [`Dispatcher`], so global and per-merchant preferences apply.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use courier_core::clock::{ReferenceZone, TimeOfDay};
use courier_core::notification_type::NotificationType;
use courier_core::report::{period_label, ReportMetrics};
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::GlobalNotificationSettings;

use crate::dispatcher::{Dispatcher, NotificationPayload};
use crate::preferences::GlobalSettingsCache;
use crate::store::{NotificationStore, ReportStore};

const DIGEST_WINDOW_DAYS: u32 = 7;

pub struct WeeklyDigest {
    dispatcher: Arc<Dispatcher>,
    reports: Arc<dyn ReportStore>,
    notifications: Arc<dyn NotificationStore>,
    settings: Arc<GlobalSettingsCache>,
    zone: ReferenceZone,
}

impl WeeklyDigest {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        reports: Arc<dyn ReportStore>,
        notifications: Arc<dyn NotificationStore>,
        settings: Arc<GlobalSettingsCache>,
        zone: ReferenceZone,
    ) -> Self {
        Self {
            dispatcher,
            reports,
            notifications,
            settings,
            zone,
        }
    }

    /// Whether this week's digest slot has arrived at `now` and was not
    /// already sent on the current local day.
    pub fn is_due(
        settings: &GlobalNotificationSettings,
        zone: &ReferenceZone,
        now: Timestamp,
        last_sent_on: Option<NaiveDate>,
    ) -> bool {
        let local = zone.local(now);
        if last_sent_on == Some(local.date()) {
            return false;
        }
        if i64::from(local.weekday().num_days_from_sunday()) != i64::from(settings.weekly_report_day)
        {
            return false;
        }
        match TimeOfDay::parse(&settings.weekly_report_time) {
            Ok(slot) => zone.time_of_day(now) >= slot,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid weekly_report_time");
                false
            }
        }
    }

    /// Send the digest if due, recording the local day in `last_sent_on`.
    /// Returns the number of merchants notified when it ran.
    pub async fn run_if_due(
        &self,
        now: Timestamp,
        last_sent_on: &mut Option<NaiveDate>,
    ) -> Option<usize> {
        let settings = match self.settings.get(self.notifications.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load global settings for digest");
                return None;
            }
        };
        if !settings.is_enabled(NotificationType::WeeklyDigest)
            || !Self::is_due(&settings, &self.zone, now, *last_sent_on)
        {
            return None;
        }

        *last_sent_on = Some(self.zone.local(now).date());
        Some(self.send_all(now).await)
    }

    /// Dispatch the digest to every active merchant. Returns how many
    /// dispatches were sent.
    pub async fn send_all(&self, now: Timestamp) -> usize {
        let merchants = match self.reports.active_merchant_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list merchants for digest");
                return 0;
            }
        };

        let since = now - Duration::days(i64::from(DIGEST_WINDOW_DAYS));
        let mut sent = 0;
        for merchant_id in merchants {
            let metrics = match self.reports.report_metrics(merchant_id, since).await {
                Ok(metrics) => metrics,
                Err(e) => {
                    tracing::warn!(merchant_id, error = %e, "Skipping digest, metrics unavailable");
                    continue;
                }
            };
            if self
                .dispatcher
                .dispatch_at(&digest_payload(merchant_id, &metrics), now)
                .await
                .succeeded()
            {
                sent += 1;
            }
        }

        tracing::info!(sent, "Weekly digest dispatched");
        sent
    }
}

fn digest_payload(merchant_id: DbId, metrics: &ReportMetrics) -> NotificationPayload {
    let body = format!(
        "{} conversations, {} orders, {:.2} revenue and {} new customers in {}.",
        metrics.conversations,
        metrics.orders,
        metrics.revenue,
        metrics.new_customers,
        period_label(DIGEST_WINDOW_DAYS),
    );
    NotificationPayload::new(
        merchant_id,
        NotificationType::WeeklyDigest,
        "Your weekly summary",
        body,
    )
    .with_url("/reports")
    .with_metadata(serde_json::json!({ "metrics": metrics }))
}
