//! Route definitions for the `/admin` resource.
//!
//! All endpoints require the admin role.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /notification-settings     -> get_settings
/// PUT    /notification-settings     -> update_settings
/// GET    /webhook-security-logs     -> list_webhook_security_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/notification-settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route(
            "/webhook-security-logs",
            get(admin::list_webhook_security_logs),
        )
}
