//! Route definitions for the `/reports` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /                -> list_reports
/// POST   /                -> create_report
/// GET    /{id}            -> get_report
/// PUT    /{id}            -> update_report
/// DELETE /{id}            -> delete_report
/// POST   /{id}/send       -> send_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reports::list_reports).post(reports::create_report))
        .route(
            "/{id}",
            get(reports::get_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
        .route("/{id}/send", post(reports::send_report))
}
