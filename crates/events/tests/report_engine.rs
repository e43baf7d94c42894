mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness, preference, report, MemoryStore, RecordingEmail, RecordingMessenger};
use courier_core::clock::ReferenceZone;
use courier_core::report::ReportMetrics;
use courier_core::types::Timestamp;
use courier_events::reports::ReportError;
use courier_events::{ReportEngine, ReportRunSummary, WeeklyDigest};

/// Wednesday.
fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 5, 6, 14, 30, 0).unwrap()
}

fn engine(store: &Arc<MemoryStore>) -> ReportEngine {
    ReportEngine::new(store.clone(), ReferenceZone::utc(), Duration::from_secs(30))
}

// ---------------------------------------------------------------------------
// Due cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weekly_report_is_sent_and_rescheduled_to_next_sunday() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let mut r = report(1, 10);
    r.recurrence = "weekly".into();
    r.schedule_day = Some(0);
    r.schedule_time = "09:00".into();
    r.next_send_at = Some(Utc.with_ymd_and_hms(2026, 5, 3, 9, 0, 0).unwrap());
    store.add_report(r);
    store.metrics.lock().unwrap().insert(
        10,
        ReportMetrics {
            conversations: 12,
            messages: 80,
            orders: 3,
            revenue: 420.5,
            new_customers: 2,
        },
    );

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;

    assert_eq!(
        summary,
        ReportRunSummary {
            processed: 1,
            sent: 1,
            failed: 0,
            skipped: 0,
        }
    );
    let after = store.report_by_id(1);
    assert_eq!(
        after.next_send_at,
        Some(Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap())
    );
    assert_eq!(after.last_sent_at, Some(now()));

    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner10@example.com");
    assert!(sent[0].subject.starts_with("Report 1"));
    assert!(sent[0].text.as_deref().unwrap().contains("- Orders: 3"));
}

#[tokio::test]
async fn never_scheduled_reports_are_due() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    store.add_report(report(1, 10));

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(
        store.report_by_id(1).next_send_at,
        Some(Utc.with_ymd_and_hms(2026, 5, 7, 9, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn reports_not_yet_due_and_inactive_reports_are_left_alone() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let future = now() + chrono::Duration::minutes(1);
    let mut upcoming = report(1, 10);
    upcoming.next_send_at = Some(future);
    let mut paused = report(2, 10);
    paused.is_active = false;
    store.add_report(upcoming);
    store.add_report(paused);

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;

    assert_eq!(summary, ReportRunSummary::default());
    assert!(email.sent().is_empty());
    assert_eq!(store.report_by_id(1).next_send_at, Some(future));
    assert_eq!(store.report_by_id(2).next_send_at, None);
}

#[tokio::test]
async fn due_reports_run_oldest_first() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let mut later = report(1, 11);
    later.next_send_at = Some(now() - chrono::Duration::hours(1));
    let mut earlier = report(2, 12);
    earlier.next_send_at = Some(now() - chrono::Duration::hours(5));
    store.add_report(later);
    store.add_report(earlier);

    engine(&store).with_email(email.clone()).process_due_at(now()).await;

    let recipients: Vec<String> = email.sent().into_iter().map(|m| m.to).collect();
    assert_eq!(recipients, vec!["owner12@example.com", "owner11@example.com"]);
}

#[tokio::test]
async fn one_failing_report_does_not_stop_the_pass() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    store.add_report(report(1, 10));
    store.add_report(report(2, 20));
    store.failing_metrics.lock().unwrap().insert(10);

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(email.sent().len(), 1);
    assert_eq!(email.sent()[0].to, "owner20@example.com");
}

#[tokio::test]
async fn every_processed_report_is_rescheduled_after_now() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();

    let ok = report(1, 10);
    let failing = report(2, 20);
    store.failing_metrics.lock().unwrap().insert(20);
    let mut bad_schedule = report(3, 30);
    bad_schedule.recurrence = "hourly".into();
    let mut no_target = report(4, 40);
    no_target.recipient_emails.clear();
    let mut monthly = report(5, 50);
    monthly.recurrence = "monthly".into();
    monthly.schedule_day = Some(31);
    for r in [ok, failing, bad_schedule, no_target, monthly] {
        store.add_report(r);
    }

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;
    assert_eq!(summary.processed, 5);

    for id in 1..=5 {
        let r = store.report_by_id(id);
        let next = r.next_send_at.expect("rescheduled");
        assert!(next > now(), "report {id} rescheduled to {next}");
        assert_eq!(r.last_sent_at, Some(now()));
    }
    assert_eq!(
        store.report_by_id(3).next_send_at,
        Some(now() + chrono::Duration::hours(24))
    );
}

#[tokio::test]
async fn missing_transport_counts_as_failed() {
    let store = MemoryStore::new();
    store.add_report(report(1, 10));

    let summary = engine(&store).process_due_at(now()).await;

    assert_eq!(summary.failed, 1);
    assert!(store.report_by_id(1).next_send_at.unwrap() > now());
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn both_method_succeeds_when_either_channel_does() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let messenger = RecordingMessenger::new();
    let mut r = report(1, 10);
    r.delivery_method = "both".into();
    r.recipient_phone = Some("+966500000000".into());
    store.add_report(r);
    email.fail_for("owner10@example.com");

    let summary = engine(&store)
        .with_email(email.clone())
        .with_messaging(messenger.clone())
        .process_due_at(now())
        .await;

    assert_eq!(summary.sent, 1);
    let messages = messenger.sent();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "+966500000000");
    assert!(messages[0].1.contains("Report 1"));
}

#[tokio::test]
async fn both_method_fails_when_every_channel_fails() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let messenger = RecordingMessenger::new();
    messenger.fail.store(true, Ordering::SeqCst);
    let mut r = report(1, 10);
    r.delivery_method = "both".into();
    r.recipient_phone = Some("+966500000000".into());
    store.add_report(r);
    email.fail_for("owner10@example.com");

    let summary = engine(&store)
        .with_email(email)
        .with_messaging(messenger)
        .process_due_at(now())
        .await;

    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn email_succeeds_if_any_recipient_accepts() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let mut r = report(1, 10);
    r.recipient_emails = vec!["a@example.com".into(), "b@example.com".into()];
    store.add_report(r);
    email.fail_for("a@example.com");

    let summary = engine(&store).with_email(email.clone()).process_due_at(now()).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(email.sent().len(), 1);
    assert_eq!(email.sent()[0].to, "b@example.com");
}

#[tokio::test(start_paused = true)]
async fn slow_report_times_out_without_blocking_the_next() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    *email.delay.lock().unwrap() = Some(Duration::from_secs(3600));
    let messenger = RecordingMessenger::new();

    store.add_report(report(1, 10));
    let mut by_message = report(2, 20);
    by_message.delivery_method = "messaging".into();
    by_message.recipient_phone = Some("+966511111111".into());
    store.add_report(by_message);

    let summary = ReportEngine::new(store.clone(), ReferenceZone::utc(), Duration::from_secs(5))
        .with_email(email.clone())
        .with_messaging(messenger.clone())
        .process_due_at(now())
        .await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 1);
    assert!(email.sent().is_empty());
    assert_eq!(messenger.sent().len(), 1);
    assert!(store.report_by_id(1).next_send_at.unwrap() > now());
}

// ---------------------------------------------------------------------------
// Claims and manual runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_claimed_elsewhere_is_skipped() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let due = now() - chrono::Duration::minutes(5);
    let mut r = report(1, 10);
    r.next_send_at = Some(due);
    store.add_report(r);
    store.claims_taken.store(true, Ordering::SeqCst);

    let summary = engine(&store)
        .with_email(email.clone())
        .with_claims(true)
        .process_due_at(now())
        .await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert!(email.sent().is_empty());
    assert_eq!(store.report_by_id(1).next_send_at, Some(due));
}

#[tokio::test]
async fn claimed_report_is_processed_and_rescheduled() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    store.add_report(report(1, 10));

    let summary = engine(&store)
        .with_email(email.clone())
        .with_claims(true)
        .process_due_at(now())
        .await;

    assert_eq!(summary.sent, 1);
    assert_eq!(
        store.report_by_id(1).next_send_at,
        Some(Utc.with_ymd_and_hms(2026, 5, 7, 9, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn manual_run_does_not_touch_the_schedule() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    let next = now() + chrono::Duration::days(3);
    let mut r = report(1, 10);
    r.next_send_at = Some(next);
    store.add_report(r);

    let sent = engine(&store).with_email(email.clone()).run_report(1).await.unwrap();

    assert!(sent);
    assert_eq!(email.sent().len(), 1);
    let after = store.report_by_id(1);
    assert_eq!(after.next_send_at, Some(next));
    assert_eq!(after.last_sent_at, None);
}

#[tokio::test(start_paused = true)]
async fn manual_run_gives_up_at_the_caller_limit() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    *email.delay.lock().unwrap() = Some(Duration::from_secs(60));
    store.add_report(report(1, 10));
    let engine = ReportEngine::new(store.clone(), ReferenceZone::utc(), Duration::from_secs(120))
        .with_email(email.clone());

    let started = tokio::time::Instant::now();
    let result = engine.run_report_within(1, Duration::from_secs(10)).await;

    assert_matches!(result, Err(ReportError::Timeout(1)));
    assert!(started.elapsed() < Duration::from_secs(60));
    assert!(email.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn manual_run_limit_never_extends_the_report_timeout() {
    let store = MemoryStore::new();
    let email = RecordingEmail::new();
    *email.delay.lock().unwrap() = Some(Duration::from_secs(60));
    store.add_report(report(1, 10));
    let engine = ReportEngine::new(store.clone(), ReferenceZone::utc(), Duration::from_secs(5))
        .with_email(email.clone());

    let started = tokio::time::Instant::now();
    let result = engine.run_report_within(1, Duration::from_secs(600)).await;

    assert_matches!(result, Err(ReportError::Timeout(1)));
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn manual_run_errors() {
    let store = MemoryStore::new();
    let mut r = report(1, 10);
    r.recipient_emails.clear();
    store.add_report(r);
    let engine = engine(&store).with_email(RecordingEmail::new());

    assert_matches!(engine.run_report(99).await, Err(ReportError::NotFound(99)));
    assert_matches!(engine.run_report(1).await, Err(ReportError::NoDeliveryTarget(1)));
}

// ---------------------------------------------------------------------------
// Weekly digest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weekly_digest_runs_once_per_slot() {
    let h = harness();
    h.store.merchants.lock().unwrap().extend([1, 2]);
    let mut opted_out = preference(2);
    opted_out.weekly_digest_enabled = false;
    h.store.set_preference(opted_out);

    let store = h.store.clone();
    let digest = WeeklyDigest::new(
        Arc::new(h.dispatcher),
        store.clone(),
        store.clone(),
        h.settings,
        ReferenceZone::utc(),
    );

    let sunday_early = Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap();
    let sunday_slot = Utc.with_ymd_and_hms(2026, 5, 10, 9, 5, 0).unwrap();
    let sunday_later = Utc.with_ymd_and_hms(2026, 5, 10, 9, 10, 0).unwrap();
    let mut last_sent_on = None;

    assert_eq!(digest.run_if_due(sunday_early, &mut last_sent_on).await, None);
    assert_eq!(digest.run_if_due(sunday_slot, &mut last_sent_on).await, Some(1));
    assert_eq!(last_sent_on, NaiveDate::from_ymd_opt(2026, 5, 10));
    assert_eq!(digest.run_if_due(sunday_later, &mut last_sent_on).await, None);

    let logs = store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].merchant_id, 1);
    assert_eq!(logs[0].notification_type, "weekly_digest");
    assert_eq!(logs[0].title, "Your weekly summary");
}

#[tokio::test]
async fn globally_disabled_digest_never_runs() {
    let h = harness();
    h.store.merchants.lock().unwrap().push(1);
    let mut global = common::global_settings();
    global.weekly_digest_enabled = false;
    h.store.set_global(global);

    let store = h.store.clone();
    let digest = WeeklyDigest::new(
        Arc::new(h.dispatcher),
        store.clone(),
        store.clone(),
        h.settings,
        ReferenceZone::utc(),
    );

    let sunday_slot = Utc.with_ymd_and_hms(2026, 5, 10, 9, 5, 0).unwrap();
    let mut last_sent_on = None;
    assert_eq!(digest.run_if_due(sunday_slot, &mut last_sent_on).await, None);
    assert_eq!(last_sent_on, None);
    assert!(store.logs().is_empty());
}
