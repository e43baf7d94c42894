//! Storage collaborator traits.
//!
//! The engine never issues queries itself: every read and write goes through
//! one of these traits. [`PgStore`](crate::PgStore) implements them on top
//! of the `courier-db` repositories; tests substitute in-memory versions.

use async_trait::async_trait;
use courier_core::report::ReportMetrics;
use courier_core::signature::WebhookPlatform;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::{
    GlobalNotificationSettings, NewNotificationLog, NotificationPreference,
};
use courier_db::models::push_subscription::PushSubscription;
use courier_db::models::scheduled_report::ScheduledReport;
use courier_db::models::webhook_security::NewWebhookSecurityLog;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Accessors used by preference resolution and dispatch.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// The singleton settings record, created with defaults if absent.
    async fn global_settings(&self) -> StoreResult<GlobalNotificationSettings>;

    /// The merchant's preferences, created with defaults if absent.
    async fn preference(&self, merchant_id: DbId) -> StoreResult<NotificationPreference>;

    async fn notification_email(&self, merchant_id: DbId) -> StoreResult<Option<String>>;

    async fn active_push_subscriptions(
        &self,
        merchant_id: DbId,
    ) -> StoreResult<Vec<PushSubscription>>;

    /// Idempotent. Returns `true` only if the subscription was active.
    async fn deactivate_push_subscription(&self, subscription_id: DbId) -> StoreResult<bool>;

    async fn create_pending_log(&self, entry: &NewNotificationLog) -> StoreResult<DbId>;

    /// Returns `false` if the row was no longer pending.
    async fn complete_log(
        &self,
        log_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<bool>;

    async fn record_push_attempt(
        &self,
        log_id: Option<DbId>,
        subscription_id: DbId,
        merchant_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<DbId>;
}

/// Accessors used by the scheduled-report engine and weekly digest.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn due_reports(&self, now: Timestamp) -> StoreResult<Vec<ScheduledReport>>;

    async fn report(&self, report_id: DbId) -> StoreResult<Option<ScheduledReport>>;

    /// Conditional move of `next_send_at` to `lease_until`. `false` means
    /// another worker claimed the report first.
    async fn claim_report(
        &self,
        report_id: DbId,
        observed_next_send_at: Option<Timestamp>,
        lease_until: Timestamp,
    ) -> StoreResult<bool>;

    async fn mark_report_processed(
        &self,
        report_id: DbId,
        sent_at: Timestamp,
        next_send_at: Timestamp,
    ) -> StoreResult<()>;

    async fn report_metrics(
        &self,
        merchant_id: DbId,
        since: Timestamp,
    ) -> StoreResult<ReportMetrics>;

    async fn active_merchant_ids(&self) -> StoreResult<Vec<DbId>>;
}

/// Accessors used by webhook verification.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn webhook_secret(
        &self,
        merchant_id: DbId,
        platform: WebhookPlatform,
    ) -> StoreResult<Option<String>>;

    async fn append_security_log(&self, entry: &NewWebhookSecurityLog) -> StoreResult<DbId>;
}
