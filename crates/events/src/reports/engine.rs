//! The scheduled-report cycle.
//!
//! [`ReportEngine::process_due`] walks every due report in order, one at a
//! time: generate content, deliver it, then reschedule. Rescheduling happens
//! whether delivery succeeded or not, so `next_send_at` always ends up
//! strictly after the pass's `now`. Each report runs under its own timeout
//! and a failure never stops the pass.
//!
//! Unlike notification dispatch, a report configured for both email and
//! messaging counts as sent when either channel succeeds: reports are
//! informational and best-effort.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use courier_core::channels::ReportDeliveryMethod;
use courier_core::clock::ReferenceZone;
use courier_core::report::RenderedReport;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::scheduled_report::ScheduledReport;

use crate::delivery::{EmailMessage, EmailSender, MessageSender};
use crate::store::ReportStore;

use super::content::generate;
use super::{ReportError, ReportRunSummary};

/// Retry delay for a report whose stored schedule cannot be parsed.
const INVALID_SCHEDULE_RETRY_HOURS: i64 = 24;

pub struct ReportEngine {
    store: Arc<dyn ReportStore>,
    email: Option<Arc<dyn EmailSender>>,
    messaging: Option<Arc<dyn MessageSender>>,
    zone: ReferenceZone,
    item_timeout: Duration,
    claim_enabled: bool,
}

impl ReportEngine {
    pub fn new(store: Arc<dyn ReportStore>, zone: ReferenceZone, item_timeout: Duration) -> Self {
        Self {
            store,
            email: None,
            messaging: None,
            zone,
            item_timeout,
            claim_enabled: false,
        }
    }

    pub fn with_email(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn with_messaging(mut self, sender: Arc<dyn MessageSender>) -> Self {
        self.messaging = Some(sender);
        self
    }

    /// Claim each report before processing it so concurrent engines do not
    /// double-send.
    pub fn with_claims(mut self, enabled: bool) -> Self {
        self.claim_enabled = enabled;
        self
    }

    pub fn zone(&self) -> &ReferenceZone {
        &self.zone
    }

    pub async fn process_due(&self) -> ReportRunSummary {
        self.process_due_at(Utc::now()).await
    }

    /// Process every report due at `now`.
    pub async fn process_due_at(&self, now: Timestamp) -> ReportRunSummary {
        let mut summary = ReportRunSummary::default();

        let due = match self.store.due_reports(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load due reports");
                return summary;
            }
        };

        for report in &due {
            if self.claim_enabled && !self.claim(report, now).await {
                summary.skipped += 1;
                continue;
            }

            summary.processed += 1;
            match self.run_with_timeout(report, now).await {
                Ok(true) => {
                    summary.sent += 1;
                    tracing::info!(report_id = report.id, merchant_id = report.merchant_id, "Report sent");
                }
                Ok(false) => {
                    summary.failed += 1;
                    tracing::warn!(report_id = report.id, "Report delivery failed on every channel");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(report_id = report.id, error = %e, "Report processing failed");
                }
            }

            self.reschedule(report, now).await;
        }

        if summary.processed > 0 || summary.skipped > 0 {
            tracing::info!(
                processed = summary.processed,
                sent = summary.sent,
                failed = summary.failed,
                skipped = summary.skipped,
                "Processed due reports"
            );
        }
        summary
    }

    /// Send one report immediately without touching its schedule.
    pub async fn run_report(&self, report_id: DbId) -> Result<bool, ReportError> {
        self.run_report_within(report_id, self.item_timeout).await
    }

    /// Like [`run_report`](Self::run_report), but gives up after `limit` when
    /// that is shorter than the per-report timeout.
    pub async fn run_report_within(
        &self,
        report_id: DbId,
        limit: Duration,
    ) -> Result<bool, ReportError> {
        let report = self
            .store
            .report(report_id)
            .await?
            .ok_or(ReportError::NotFound(report_id))?;
        tokio::time::timeout(limit.min(self.item_timeout), self.deliver(&report, Utc::now()))
            .await
            .map_err(|_| ReportError::Timeout(report.id))?
    }

    /// Next run for `report` strictly after `now`.
    pub fn next_run(&self, report: &ScheduledReport, now: Timestamp) -> Timestamp {
        match report.schedule() {
            Ok(schedule) => schedule.next_after(now, &self.zone),
            Err(e) => {
                tracing::warn!(report_id = report.id, error = %e, "Invalid report schedule");
                now + chrono::Duration::hours(INVALID_SCHEDULE_RETRY_HOURS)
            }
        }
    }

    async fn claim(&self, report: &ScheduledReport, now: Timestamp) -> bool {
        // Lease outlives the processing timeout; the reschedule overwrites it.
        let lease = chrono::Duration::from_std(self.item_timeout * 2)
            .unwrap_or_else(|_| chrono::Duration::hours(INVALID_SCHEDULE_RETRY_HOURS));
        match self
            .store
            .claim_report(report.id, report.next_send_at, now + lease)
            .await
        {
            Ok(claimed) => {
                if !claimed {
                    tracing::debug!(report_id = report.id, "Report claimed by another worker");
                }
                claimed
            }
            Err(e) => {
                tracing::error!(report_id = report.id, error = %e, "Failed to claim report");
                false
            }
        }
    }

    async fn reschedule(&self, report: &ScheduledReport, now: Timestamp) {
        let next = self.next_run(report, now);
        if let Err(e) = self.store.mark_report_processed(report.id, now, next).await {
            tracing::error!(report_id = report.id, error = %e, "Failed to reschedule report");
        }
    }

    async fn run_with_timeout(
        &self,
        report: &ScheduledReport,
        now: Timestamp,
    ) -> Result<bool, ReportError> {
        tokio::time::timeout(self.item_timeout, self.deliver(report, now))
            .await
            .map_err(|_| ReportError::Timeout(report.id))?
    }

    /// Generate and deliver. `Ok(true)` when at least one channel succeeded.
    async fn deliver(&self, report: &ScheduledReport, now: Timestamp) -> Result<bool, ReportError> {
        let method = report.delivery_method()?;
        let content = generate(self.store.as_ref(), report, now).await?;

        let email = match (method.includes_email(), &self.email) {
            (true, Some(sender)) if !report.recipient_emails.is_empty() => {
                Some(self.send_email(sender.as_ref(), report, &content).await)
            }
            _ => None,
        };
        let messaging = match (method.includes_messaging(), &self.messaging, &report.recipient_phone) {
            (true, Some(sender), Some(phone)) if !phone.trim().is_empty() => {
                Some(self.send_message(sender.as_ref(), report, phone, &content).await)
            }
            _ => None,
        };

        if email.is_none() && messaging.is_none() {
            return Err(ReportError::NoDeliveryTarget(report.id));
        }
        Ok(combine(method, email, messaging))
    }

    /// Email every recipient; succeeds if any recipient accepted it.
    async fn send_email(
        &self,
        sender: &dyn EmailSender,
        report: &ScheduledReport,
        content: &RenderedReport,
    ) -> bool {
        let mut any_ok = false;
        for to in &report.recipient_emails {
            let message = EmailMessage {
                to: to.clone(),
                subject: content.subject.clone(),
                html: content.html.clone(),
                text: Some(content.text.clone()),
            };
            match sender.send(&message).await {
                Ok(()) => any_ok = true,
                Err(e) => {
                    tracing::warn!(report_id = report.id, to = %to, error = %e, "Report email failed");
                }
            }
        }
        any_ok
    }

    async fn send_message(
        &self,
        sender: &dyn MessageSender,
        report: &ScheduledReport,
        phone: &str,
        content: &RenderedReport,
    ) -> bool {
        match sender.send_text(phone, &content.text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(report_id = report.id, error = %e, "Report message failed");
                false
            }
        }
    }
}

/// Fold per-channel results. `None` means the channel was not attempted.
fn combine(method: ReportDeliveryMethod, email: Option<bool>, messaging: Option<bool>) -> bool {
    match method {
        ReportDeliveryMethod::Email => email.unwrap_or(false),
        ReportDeliveryMethod::Messaging => messaging.unwrap_or(false),
        ReportDeliveryMethod::Both => email.unwrap_or(false) || messaging.unwrap_or(false),
    }
}
