pub mod admin;
pub mod health;
pub mod notification;
pub mod reports;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notifications/preferences                       get, update
/// /notifications/logs                              list
/// /notifications/push-subscriptions                list, register
/// /notifications/push-subscriptions/{id}           delete
///
/// /reports                                         list, create
/// /reports/{id}                                    get, update, delete
/// /reports/{id}/send                               send now (POST)
///
/// /admin/notification-settings                     get, update (admin only)
/// /admin/webhook-security-logs                     list (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notifications", notification::router())
        .nest("/reports", reports::router())
        .nest("/admin", admin::router())
}
