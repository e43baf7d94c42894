//! Report content generation.

use chrono::Duration;
use courier_core::report::{render, RenderedReport};
use courier_core::types::Timestamp;
use courier_db::models::scheduled_report::ScheduledReport;

use crate::store::ReportStore;

use super::ReportError;

/// Pull the merchant's metrics for the report's trailing window ending at
/// `now` and render them.
pub async fn generate(
    store: &dyn ReportStore,
    report: &ScheduledReport,
    now: Timestamp,
) -> Result<RenderedReport, ReportError> {
    let days = report.trailing_days();
    let since = now - Duration::days(i64::from(days));
    let metrics = store.report_metrics(report.merchant_id, since).await?;
    Ok(render(&report.name, days, &metrics, &report.content_flags()))
}
