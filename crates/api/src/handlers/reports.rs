//! Handlers for merchant-scoped scheduled reports.
//!
//! Creation and any change to the recurrence fields recompute
//! `next_send_at` from the current time. `POST /{id}/send` delivers one
//! report immediately and leaves its schedule untouched.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use courier_core::channels::ReportDeliveryMethod;
use courier_core::clock::TimeOfDay;
use courier_core::error::CoreError;
use courier_core::recurrence::ReportSchedule;
use courier_core::types::DbId;
use courier_db::models::scheduled_report::{
    CreateScheduledReport, ScheduledReport, UpdateScheduledReport,
};
use courier_db::repositories::ScheduledReportRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::merchant::MerchantContext;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SendResult {
    pub report_id: DbId,
    pub sent: bool,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ScheduledReport",
        id,
    })
}

/// GET /api/v1/reports
pub async fn list_reports(
    merchant: MerchantContext,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ScheduledReport>>>> {
    let reports = ScheduledReportRepo::list_for_merchant(&state.pool, merchant.merchant_id).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// POST /api/v1/reports
pub async fn create_report(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Json(input): Json<CreateScheduledReport>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation("name is required".into())));
    }
    let schedule = ReportSchedule::new(
        input.recurrence,
        input.schedule_day,
        TimeOfDay::parse(&input.schedule_time)?,
    )?;
    validate_delivery_target(
        input.delivery_method,
        &input.recipient_emails,
        input.recipient_phone.as_deref(),
    )?;

    let next_send_at = schedule.next_after(Utc::now(), &state.zone);
    let report = ScheduledReportRepo::create(
        &state.pool,
        merchant.merchant_id,
        &input,
        Some(next_send_at),
    )
    .await?;

    tracing::info!(
        merchant_id = merchant.merchant_id,
        report_id = report.id,
        next_send_at = %next_send_at,
        "Scheduled report created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Path(report_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ScheduledReport>>> {
    let report = ScheduledReportRepo::find_for_merchant(&state.pool, merchant.merchant_id, report_id)
        .await?
        .ok_or_else(|| not_found(report_id))?;
    Ok(Json(DataResponse { data: report }))
}

/// PUT /api/v1/reports/{id}
///
/// The merged result is validated as a whole, so a partial update cannot
/// leave an unschedulable or undeliverable report behind.
pub async fn update_report(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Path(report_id): Path<DbId>,
    Json(input): Json<UpdateScheduledReport>,
) -> AppResult<Json<DataResponse<ScheduledReport>>> {
    let existing =
        ScheduledReportRepo::find_for_merchant(&state.pool, merchant.merchant_id, report_id)
            .await?
            .ok_or_else(|| not_found(report_id))?;

    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation("name cannot be empty".into())));
    }

    let recurrence = match input.recurrence {
        Some(r) => r,
        None => existing.schedule()?.recurrence,
    };
    let schedule = ReportSchedule::new(
        recurrence,
        input.schedule_day.or(existing.schedule_day),
        TimeOfDay::parse(input.schedule_time.as_deref().unwrap_or(&existing.schedule_time))?,
    )?;

    let method = match input.delivery_method {
        Some(m) => m,
        None => existing.delivery_method()?,
    };
    validate_delivery_target(
        method,
        input.recipient_emails.as_ref().unwrap_or(&existing.recipient_emails),
        input
            .recipient_phone
            .as_deref()
            .or(existing.recipient_phone.as_deref()),
    )?;

    let schedule_changed = input.recurrence.is_some()
        || input.schedule_day.is_some()
        || input.schedule_time.is_some();
    let next_send_at = schedule_changed.then(|| schedule.next_after(Utc::now(), &state.zone));

    let report = ScheduledReportRepo::update(
        &state.pool,
        merchant.merchant_id,
        report_id,
        &input,
        next_send_at,
    )
    .await?
    .ok_or_else(|| not_found(report_id))?;

    tracing::info!(
        merchant_id = merchant.merchant_id,
        report_id,
        rescheduled = schedule_changed,
        "Scheduled report updated"
    );
    Ok(Json(DataResponse { data: report }))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete_report(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Path(report_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ScheduledReportRepo::delete(&state.pool, merchant.merchant_id, report_id).await?;
    if !deleted {
        return Err(not_found(report_id));
    }
    tracing::info!(merchant_id = merchant.merchant_id, report_id, "Scheduled report deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Headroom left between an on-demand run giving up and the request timeout.
const SEND_TIMEOUT_MARGIN: Duration = Duration::from_secs(2);

/// POST /api/v1/reports/{id}/send
///
/// The run is cut short before the request timeout so the caller gets the
/// run's own error instead of a bare 408.
pub async fn send_report(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Path(report_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SendResult>>> {
    ScheduledReportRepo::find_for_merchant(&state.pool, merchant.merchant_id, report_id)
        .await?
        .ok_or_else(|| not_found(report_id))?;

    let limit = send_budget(state.config.request_timeout_secs);
    let sent = state.report_engine.run_report_within(report_id, limit).await?;

    tracing::info!(merchant_id = merchant.merchant_id, report_id, sent, "On-demand report run");
    Ok(Json(DataResponse {
        data: SendResult { report_id, sent },
    }))
}

fn send_budget(request_timeout_secs: u64) -> Duration {
    let request_timeout = Duration::from_secs(request_timeout_secs);
    request_timeout
        .checked_sub(SEND_TIMEOUT_MARGIN)
        .filter(|budget| !budget.is_zero())
        .unwrap_or(request_timeout / 2)
}

/// Every channel the method names must have somewhere to go.
fn validate_delivery_target(
    method: ReportDeliveryMethod,
    emails: &[String],
    phone: Option<&str>,
) -> Result<(), CoreError> {
    let has_email = emails.iter().any(|e| !e.trim().is_empty());
    let has_phone = phone.is_some_and(|p| !p.trim().is_empty());

    if emails.iter().any(|e| !e.contains('@')) {
        return Err(CoreError::Validation(
            "recipient_emails must contain valid addresses".into(),
        ));
    }
    if method.includes_email() && !has_email {
        return Err(CoreError::Validation(format!(
            "delivery method '{}' requires at least one recipient email",
            method.as_str()
        )));
    }
    if method.includes_messaging() && !has_phone {
        return Err(CoreError::Validation(format!(
            "delivery method '{}' requires a recipient phone",
            method.as_str()
        )));
    }
    Ok(())
}
