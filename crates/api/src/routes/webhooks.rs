//! Route definitions for inbound platform webhooks.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at the root (platforms are configured with this URL).
///
/// ```text
/// POST   /webhooks/{platform}       -> receive
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/{platform}", post(webhooks::receive))
}
