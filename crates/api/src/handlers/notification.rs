//! Handlers for the merchant-scoped `/notifications` resource.
//!
//! All endpoints act for the merchant in [`MerchantContext`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use courier_core::clock::TimeOfDay;
use courier_core::error::CoreError;
use courier_core::types::DbId;
use courier_db::models::notification::{
    NotificationLog, NotificationPreference, UpdateNotificationPreference,
};
use courier_db::models::push_subscription::{CreatePushSubscription, PushSubscription};
use courier_db::repositories::{
    NotificationLogRepo, NotificationPreferenceRepo, PushSubscriptionRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::merchant::MerchantContext;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
///
/// The merchant's preferences, created with defaults on first read.
pub async fn get_preferences(
    merchant: MerchantContext,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPreference>>> {
    let preference =
        NotificationPreferenceRepo::get_or_create(&state.pool, merchant.merchant_id).await?;
    Ok(Json(DataResponse { data: preference }))
}

/// PUT /api/v1/notifications/preferences
///
/// Partial update; omitted fields keep their current value.
pub async fn update_preferences(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Json(input): Json<UpdateNotificationPreference>,
) -> AppResult<Json<DataResponse<NotificationPreference>>> {
    validate_preference_update(&input)?;

    let preference =
        NotificationPreferenceRepo::upsert(&state.pool, merchant.merchant_id, &input).await?;

    tracing::info!(merchant_id = merchant.merchant_id, "Notification preferences updated");
    Ok(Json(DataResponse { data: preference }))
}

fn validate_preference_update(input: &UpdateNotificationPreference) -> Result<(), CoreError> {
    if let Some(start) = &input.quiet_hours_start {
        TimeOfDay::parse(start)?;
    }
    if let Some(end) = &input.quiet_hours_end {
        TimeOfDay::parse(end)?;
    }
    if let Some(minutes) = input.batch_interval_minutes {
        if minutes <= 0 {
            return Err(CoreError::Validation(
                "batch_interval_minutes must be positive".into(),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Delivery logs
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/logs
///
/// Newest first, paginated with `?limit=&offset=`.
pub async fn list_logs(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<NotificationLog>>>> {
    let logs = NotificationLogRepo::list_for_merchant(
        &state.pool,
        merchant.merchant_id,
        params.limit(),
        params.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: logs }))
}

// ---------------------------------------------------------------------------
// Push subscriptions
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/push-subscriptions
pub async fn list_push_subscriptions(
    merchant: MerchantContext,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PushSubscription>>>> {
    let subscriptions =
        PushSubscriptionRepo::list_active(&state.pool, merchant.merchant_id).await?;
    Ok(Json(DataResponse {
        data: subscriptions,
    }))
}

/// POST /api/v1/notifications/push-subscriptions
///
/// Registers a browser endpoint. Re-registering a known endpoint
/// reactivates it and refreshes its keys.
pub async fn create_push_subscription(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Json(input): Json<CreatePushSubscription>,
) -> AppResult<impl IntoResponse> {
    if input.endpoint.trim().is_empty() || input.p256dh.is_empty() || input.auth.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "endpoint, p256dh and auth are required".into(),
        )));
    }
    if !input.endpoint.starts_with("https://") {
        return Err(AppError::Core(CoreError::Validation(
            "endpoint must be an https URL".into(),
        )));
    }

    let subscription = PushSubscriptionRepo::upsert(&state.pool, merchant.merchant_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "endpoint is registered to another merchant".into(),
            ))
        })?;

    tracing::info!(
        merchant_id = merchant.merchant_id,
        subscription_id = subscription.id,
        "Push subscription registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: subscription }),
    ))
}

/// DELETE /api/v1/notifications/push-subscriptions/{id}
///
/// 204 on success, 404 if the subscription does not belong to the merchant.
pub async fn delete_push_subscription(
    merchant: MerchantContext,
    State(state): State<AppState>,
    Path(subscription_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted =
        PushSubscriptionRepo::delete(&state.pool, merchant.merchant_id, subscription_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PushSubscription",
            id: subscription_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}
