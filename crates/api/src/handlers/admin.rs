//! Platform-admin handlers: global notification switches and the webhook
//! security audit log.

use axum::extract::{Query, State};
use axum::Json;
use courier_core::clock::TimeOfDay;
use courier_core::error::CoreError;
use courier_core::types::DbId;
use courier_db::models::notification::{GlobalNotificationSettings, UpdateGlobalSettings};
use courier_db::models::webhook_security::WebhookSecurityLog;
use courier_db::repositories::{GlobalSettingsRepo, WebhookSecurityLogRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::merchant::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /admin/webhook-security-logs`.
#[derive(Debug, Deserialize)]
pub struct SecurityLogQuery {
    pub merchant_id: Option<DbId>,
    /// Only failed verifications.
    #[serde(default)]
    pub invalid_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/admin/notification-settings
pub async fn get_settings(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<GlobalNotificationSettings>>> {
    let settings = GlobalSettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/admin/notification-settings
///
/// The dispatcher's cached copy is replaced with the updated row so the
/// change applies to the next dispatch.
pub async fn update_settings(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateGlobalSettings>,
) -> AppResult<Json<DataResponse<GlobalNotificationSettings>>> {
    validate_settings_update(&input)?;

    let settings = GlobalSettingsRepo::update(&state.pool, &input).await?;
    state.settings_cache.replace(settings.clone()).await;

    tracing::info!("Global notification settings updated");
    Ok(Json(DataResponse { data: settings }))
}

fn validate_settings_update(input: &UpdateGlobalSettings) -> Result<(), CoreError> {
    if let Some(day) = input.weekly_report_day {
        if !(0..=6).contains(&day) {
            return Err(CoreError::Validation(format!(
                "weekly_report_day must be 0-6 (0 = Sunday), got {day}"
            )));
        }
    }
    if let Some(time) = &input.weekly_report_time {
        TimeOfDay::parse(time)?;
    }
    Ok(())
}

/// GET /api/v1/admin/webhook-security-logs
pub async fn list_webhook_security_logs(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<SecurityLogQuery>,
) -> AppResult<Json<DataResponse<Vec<WebhookSecurityLog>>>> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let logs = WebhookSecurityLogRepo::list(
        &state.pool,
        params.merchant_id,
        params.invalid_only,
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: logs }))
}
