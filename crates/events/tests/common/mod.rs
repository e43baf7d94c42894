//! In-memory storage and recording transports for engine tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::clock::ReferenceZone;
use courier_core::report::ReportMetrics;
use courier_core::signature::WebhookPlatform;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::{
    GlobalNotificationSettings, NewNotificationLog, NotificationLog, NotificationPreference,
    PushNotificationLog,
};
use courier_db::models::push_subscription::PushSubscription;
use courier_db::models::scheduled_report::ScheduledReport;
use courier_db::models::webhook_security::NewWebhookSecurityLog;
use courier_events::delivery::{
    EmailError, EmailMessage, EmailSender, MessageSender, MessagingError, PushError,
    PushMessage, PushSender,
};
use courier_events::store::{NotificationStore, ReportStore, StoreResult, WebhookStore};
use courier_events::{Dispatcher, EventBus, GlobalSettingsCache};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn global_settings() -> GlobalNotificationSettings {
    GlobalNotificationSettings {
        id: 1,
        new_order_enabled: true,
        new_message_enabled: true,
        appointment_enabled: true,
        order_status_enabled: true,
        missed_message_enabled: true,
        disconnect_alert_enabled: true,
        low_stock_enabled: true,
        weekly_digest_enabled: true,
        weekly_report_day: 0,
        weekly_report_time: "09:00".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn preference(merchant_id: DbId) -> NotificationPreference {
    NotificationPreference {
        id: merchant_id,
        merchant_id,
        new_order_enabled: true,
        new_message_enabled: true,
        appointment_enabled: true,
        order_status_enabled: true,
        missed_message_enabled: true,
        disconnect_alert_enabled: true,
        low_stock_enabled: true,
        weekly_digest_enabled: true,
        preferred_channel: "both".to_string(),
        quiet_hours_enabled: false,
        quiet_hours_start: "22:00".to_string(),
        quiet_hours_end: "08:00".to_string(),
        batching_enabled: false,
        batch_interval_minutes: 15,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn subscription(id: DbId, merchant_id: DbId) -> PushSubscription {
    PushSubscription {
        id,
        merchant_id,
        endpoint: format!("https://push.example.com/{id}"),
        p256dh: "p256dh".to_string(),
        auth: "auth".to_string(),
        user_agent: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn report(id: DbId, merchant_id: DbId) -> ScheduledReport {
    ScheduledReport {
        id,
        merchant_id,
        name: format!("Report {id}"),
        recurrence: "daily".to_string(),
        schedule_day: None,
        schedule_time: "09:00".to_string(),
        delivery_method: "email".to_string(),
        recipient_emails: vec![format!("owner{merchant_id}@example.com")],
        recipient_phone: None,
        include_conversations: true,
        include_orders: true,
        include_revenue: true,
        include_customers: true,
        is_active: true,
        last_sent_at: None,
        next_send_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

fn unavailable() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

#[derive(Default)]
pub struct MemoryStore {
    pub global: Mutex<Option<GlobalNotificationSettings>>,
    pub global_reads: AtomicUsize,
    pub preferences: Mutex<HashMap<DbId, NotificationPreference>>,
    pub fail_preferences: AtomicBool,
    pub emails: Mutex<HashMap<DbId, String>>,
    pub subscriptions: Mutex<Vec<PushSubscription>>,
    pub logs: Mutex<Vec<NotificationLog>>,
    pub push_logs: Mutex<Vec<PushNotificationLog>>,
    pub reports: Mutex<Vec<ScheduledReport>>,
    pub metrics: Mutex<HashMap<DbId, ReportMetrics>>,
    pub failing_metrics: Mutex<HashSet<DbId>>,
    pub merchants: Mutex<Vec<DbId>>,
    /// Every claim attempt loses, as if another worker got there first.
    pub claims_taken: AtomicBool,
    pub secrets: Mutex<HashMap<(DbId, WebhookPlatform), String>>,
    pub fail_secret_lookup: AtomicBool,
    pub security_logs: Mutex<Vec<NewWebhookSecurityLog>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_global(&self, settings: GlobalNotificationSettings) {
        *self.global.lock().unwrap() = Some(settings);
    }

    pub fn set_preference(&self, preference: NotificationPreference) {
        self.preferences
            .lock()
            .unwrap()
            .insert(preference.merchant_id, preference);
    }

    pub fn set_email(&self, merchant_id: DbId, email: &str) {
        self.emails.lock().unwrap().insert(merchant_id, email.to_string());
    }

    pub fn add_subscription(&self, subscription: PushSubscription) {
        self.subscriptions.lock().unwrap().push(subscription);
    }

    pub fn add_report(&self, report: ScheduledReport) {
        self.reports.lock().unwrap().push(report);
    }

    pub fn set_secret(&self, merchant_id: DbId, platform: WebhookPlatform, secret: &str) {
        self.secrets
            .lock()
            .unwrap()
            .insert((merchant_id, platform), secret.to_string());
    }

    pub fn subscription_active(&self, id: DbId) -> bool {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.id == id && s.is_active)
    }

    pub fn report_by_id(&self, id: DbId) -> ScheduledReport {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("report exists")
    }

    pub fn logs(&self) -> Vec<NotificationLog> {
        self.logs.lock().unwrap().clone()
    }

    pub fn push_logs(&self) -> Vec<PushNotificationLog> {
        self.push_logs.lock().unwrap().clone()
    }

    pub fn security_logs(&self) -> Vec<NewWebhookSecurityLog> {
        self.security_logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn global_settings(&self) -> StoreResult<GlobalNotificationSettings> {
        self.global_reads.fetch_add(1, Ordering::SeqCst);
        let mut global = self.global.lock().unwrap();
        Ok(global.get_or_insert_with(global_settings).clone())
    }

    async fn preference(&self, merchant_id: DbId) -> StoreResult<NotificationPreference> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .entry(merchant_id)
            .or_insert_with(|| preference(merchant_id))
            .clone())
    }

    async fn notification_email(&self, merchant_id: DbId) -> StoreResult<Option<String>> {
        Ok(self.emails.lock().unwrap().get(&merchant_id).cloned())
    }

    async fn active_push_subscriptions(
        &self,
        merchant_id: DbId,
    ) -> StoreResult<Vec<PushSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.merchant_id == merchant_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn deactivate_push_subscription(&self, subscription_id: DbId) -> StoreResult<bool> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id && s.is_active)
        {
            Some(s) => {
                s.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_pending_log(&self, entry: &NewNotificationLog) -> StoreResult<DbId> {
        let mut logs = self.logs.lock().unwrap();
        let id = logs.len() as DbId + 1;
        logs.push(NotificationLog {
            id,
            merchant_id: entry.merchant_id,
            notification_type: entry.notification_type.as_str().to_string(),
            channel: entry.channel.as_str().to_string(),
            title: entry.title.clone(),
            body: entry.body.clone(),
            status: "pending".to_string(),
            error: None,
            sent_at: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn complete_log(
        &self,
        log_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<bool> {
        let mut logs = self.logs.lock().unwrap();
        let Some(log) = logs.iter_mut().find(|l| l.id == log_id && l.status == "pending") else {
            return Ok(false);
        };
        log.status = if succeeded { "sent" } else { "failed" }.to_string();
        log.error = error.map(str::to_string);
        log.sent_at = succeeded.then(Utc::now);
        Ok(true)
    }

    async fn record_push_attempt(
        &self,
        log_id: Option<DbId>,
        subscription_id: DbId,
        merchant_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<DbId> {
        let mut push_logs = self.push_logs.lock().unwrap();
        let id = push_logs.len() as DbId + 1;
        push_logs.push(PushNotificationLog {
            id,
            notification_log_id: log_id,
            subscription_id,
            merchant_id,
            status: if succeeded { "sent" } else { "failed" }.to_string(),
            error: error.map(str::to_string),
            sent_at: succeeded.then(Utc::now),
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn due_reports(&self, now: Timestamp) -> StoreResult<Vec<ScheduledReport>> {
        let mut due: Vec<ScheduledReport> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active && r.next_send_at.map_or(true, |next| next <= now))
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.next_send_at, r.id));
        Ok(due)
    }

    async fn report(&self, report_id: DbId) -> StoreResult<Option<ScheduledReport>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == report_id)
            .cloned())
    }

    async fn claim_report(
        &self,
        report_id: DbId,
        observed_next_send_at: Option<Timestamp>,
        lease_until: Timestamp,
    ) -> StoreResult<bool> {
        if self.claims_taken.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut reports = self.reports.lock().unwrap();
        match reports
            .iter_mut()
            .find(|r| r.id == report_id && r.next_send_at == observed_next_send_at)
        {
            Some(r) => {
                r.next_send_at = Some(lease_until);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_report_processed(
        &self,
        report_id: DbId,
        sent_at: Timestamp,
        next_send_at: Timestamp,
    ) -> StoreResult<()> {
        let mut reports = self.reports.lock().unwrap();
        if let Some(r) = reports.iter_mut().find(|r| r.id == report_id) {
            r.last_sent_at = Some(sent_at);
            r.next_send_at = Some(next_send_at);
        }
        Ok(())
    }

    async fn report_metrics(
        &self,
        merchant_id: DbId,
        _since: Timestamp,
    ) -> StoreResult<ReportMetrics> {
        if self.failing_metrics.lock().unwrap().contains(&merchant_id) {
            return Err(unavailable());
        }
        Ok(self
            .metrics
            .lock()
            .unwrap()
            .get(&merchant_id)
            .copied()
            .unwrap_or_default())
    }

    async fn active_merchant_ids(&self) -> StoreResult<Vec<DbId>> {
        Ok(self.merchants.lock().unwrap().clone())
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn webhook_secret(
        &self,
        merchant_id: DbId,
        platform: WebhookPlatform,
    ) -> StoreResult<Option<String>> {
        if self.fail_secret_lookup.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .get(&(merchant_id, platform))
            .cloned())
    }

    async fn append_security_log(&self, entry: &NewWebhookSecurityLog) -> StoreResult<DbId> {
        let mut logs = self.security_logs.lock().unwrap();
        logs.push(entry.clone());
        Ok(logs.len() as DbId)
    }
}

// ---------------------------------------------------------------------------
// Recording transports
// ---------------------------------------------------------------------------

/// Push transport that records every call. Subscriptions listed in `gone`
/// answer 410, those in `failing` answer 500.
#[derive(Default)]
pub struct RecordingPush {
    pub calls: Mutex<Vec<DbId>>,
    pub gone: Mutex<HashSet<DbId>>,
    pub failing: Mutex<HashSet<DbId>>,
}

impl RecordingPush {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        _message: &PushMessage,
    ) -> Result<(), PushError> {
        self.calls.lock().unwrap().push(subscription.id);
        if self.gone.lock().unwrap().contains(&subscription.id) {
            return Err(PushError::Gone(410));
        }
        if self.failing.lock().unwrap().contains(&subscription.id) {
            return Err(PushError::HttpStatus(500));
        }
        Ok(())
    }
}

/// Email transport that records sent messages. Recipients in `failing`
/// are rejected; `delay` stalls every send.
#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub failing: Mutex<HashSet<String>>,
    pub delay: Mutex<Option<Duration>>,
}

impl RecordingEmail {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, to: &str) {
        self.failing.lock().unwrap().insert(to.to_string());
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&message.to) {
            return Err(EmailError::Build("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingMessenger {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MessagingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessagingError::HttpStatus(503));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub push: Arc<RecordingPush>,
    pub email: Arc<RecordingEmail>,
    pub bus: Arc<EventBus>,
    pub settings: Arc<GlobalSettingsCache>,
    pub dispatcher: Dispatcher,
}

/// A dispatcher over a fresh memory store with both transports attached.
pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let push = RecordingPush::new();
    let email = RecordingEmail::new();
    let bus = Arc::new(EventBus::default());
    let settings = Arc::new(GlobalSettingsCache::new(Duration::from_secs(60)));
    let dispatcher = Dispatcher::new(
        store.clone(),
        Arc::clone(&settings),
        ReferenceZone::utc(),
        Arc::clone(&bus),
    )
    .with_push(push.clone())
    .with_email(email.clone());

    Harness {
        store,
        push,
        email,
        bus,
        settings,
        dispatcher,
    }
}
