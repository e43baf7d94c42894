//! PostgreSQL implementation of the storage traits.

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
use courier_db::repositories::{
    GlobalSettingsRepo, MerchantRepo, MetricsRepo, NotificationLogRepo,
    NotificationPreferenceRepo, PushSubscriptionRepo, ScheduledReportRepo,
    WebhookSecurityLogRepo,
};
use courier_db::DbPool;

use crate::store::{NotificationStore, ReportStore, StoreResult, WebhookStore};

/// Delegates every accessor to the matching `courier-db` repository.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn global_settings(&self) -> StoreResult<GlobalNotificationSettings> {
        GlobalSettingsRepo::get(&self.pool).await
    }

    async fn preference(&self, merchant_id: DbId) -> StoreResult<NotificationPreference> {
        NotificationPreferenceRepo::get_or_create(&self.pool, merchant_id).await
    }

    async fn notification_email(&self, merchant_id: DbId) -> StoreResult<Option<String>> {
        MerchantRepo::notification_email(&self.pool, merchant_id).await
    }

    async fn active_push_subscriptions(
        &self,
        merchant_id: DbId,
    ) -> StoreResult<Vec<PushSubscription>> {
        PushSubscriptionRepo::list_active(&self.pool, merchant_id).await
    }

    async fn deactivate_push_subscription(&self, subscription_id: DbId) -> StoreResult<bool> {
        PushSubscriptionRepo::deactivate(&self.pool, subscription_id).await
    }

    async fn create_pending_log(&self, entry: &NewNotificationLog) -> StoreResult<DbId> {
        NotificationLogRepo::create_pending(&self.pool, entry).await
    }

    async fn complete_log(
        &self,
        log_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<bool> {
        NotificationLogRepo::complete(&self.pool, log_id, succeeded, error).await
    }

    async fn record_push_attempt(
        &self,
        log_id: Option<DbId>,
        subscription_id: DbId,
        merchant_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<DbId> {
        NotificationLogRepo::record_push_attempt(
            &self.pool,
            log_id,
            subscription_id,
            merchant_id,
            succeeded,
            error,
        )
        .await
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn due_reports(&self, now: Timestamp) -> StoreResult<Vec<ScheduledReport>> {
        ScheduledReportRepo::list_due(&self.pool, now).await
    }

    async fn report(&self, report_id: DbId) -> StoreResult<Option<ScheduledReport>> {
        ScheduledReportRepo::find_by_id(&self.pool, report_id).await
    }

    async fn claim_report(
        &self,
        report_id: DbId,
        observed_next_send_at: Option<Timestamp>,
        lease_until: Timestamp,
    ) -> StoreResult<bool> {
        ScheduledReportRepo::claim(&self.pool, report_id, observed_next_send_at, lease_until).await
    }

    async fn mark_report_processed(
        &self,
        report_id: DbId,
        sent_at: Timestamp,
        next_send_at: Timestamp,
    ) -> StoreResult<()> {
        ScheduledReportRepo::mark_processed(&self.pool, report_id, sent_at, next_send_at).await
    }

    async fn report_metrics(
        &self,
        merchant_id: DbId,
        since: Timestamp,
    ) -> StoreResult<ReportMetrics> {
        MetricsRepo::report_metrics(&self.pool, merchant_id, since).await
    }

    async fn active_merchant_ids(&self) -> StoreResult<Vec<DbId>> {
        MerchantRepo::list_active_ids(&self.pool).await
    }
}

#[async_trait]
impl WebhookStore for PgStore {
    async fn webhook_secret(
        &self,
        merchant_id: DbId,
        platform: WebhookPlatform,
    ) -> StoreResult<Option<String>> {
        MerchantRepo::webhook_secret(&self.pool, merchant_id, platform.as_str()).await
    }

    async fn append_security_log(&self, entry: &NewWebhookSecurityLog) -> StoreResult<DbId> {
        WebhookSecurityLogRepo::create(&self.pool, entry).await
    }
}
