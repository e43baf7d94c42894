//! Merchant and admin identity extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use courier_core::error::CoreError;
use courier_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the authenticated merchant id.
pub const MERCHANT_ID_HEADER: &str = "x-merchant-id";

/// Header carrying the authenticated caller's role.
pub const ROLE_HEADER: &str = "x-role";

pub const ROLE_ADMIN: &str = "admin";

/// Parse a positive merchant id from the [`MERCHANT_ID_HEADER`] header.
pub fn merchant_id_from_headers(headers: &HeaderMap) -> Option<DbId> {
    headers
        .get(MERCHANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<DbId>().ok())
        .filter(|id| *id > 0)
}

/// The merchant a request acts for.
///
/// ```ignore
/// async fn my_handler(merchant: MerchantContext) -> AppResult<Json<()>> {
///     tracing::info!(merchant_id = merchant.merchant_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MerchantContext {
    pub merchant_id: DbId,
}

impl FromRequestParts<AppState> for MerchantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let merchant_id = merchant_id_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Missing or invalid {MERCHANT_ID_HEADER} header"
            )))
        })?;
        Ok(MerchantContext { merchant_id })
    }
}

/// Requires the `admin` role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!("Missing {ROLE_HEADER} header")))
            })?;

        if role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin)
    }
}
