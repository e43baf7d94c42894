//! Route definitions for the `/notifications` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /preferences               -> get_preferences
/// PUT    /preferences               -> update_preferences
///
/// GET    /logs                      -> list_logs
///
/// GET    /push-subscriptions        -> list_push_subscriptions
/// POST   /push-subscriptions        -> create_push_subscription
/// DELETE /push-subscriptions/{id}   -> delete_push_subscription
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences",
            get(notification::get_preferences).put(notification::update_preferences),
        )
        .route("/logs", get(notification::list_logs))
        .route(
            "/push-subscriptions",
            get(notification::list_push_subscriptions)
                .post(notification::create_push_subscription),
        )
        .route(
            "/push-subscriptions/{id}",
            delete(notification::delete_push_subscription),
        )
}
