//! Handler for signed inbound webhooks from commerce platforms.
//!
//! The raw body is verified before it is parsed: a request that fails
//! verification never reaches business logic. Accepted requests are
//! published on the event bus as `webhook.received`.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{Extensions, HeaderMap, Method, Uri};
use axum::Json;
use courier_core::error::CoreError;
use courier_core::signature::WebhookPlatform;
use courier_core::types::DbId;
use courier_events::bus::{PlatformEvent, EVENT_WEBHOOK_RECEIVED};
use courier_events::WebhookRequest;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::merchant::merchant_id_from_headers;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `POST /webhooks/{platform}`.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    /// Fallback when the `x-merchant-id` header is absent.
    pub merchant_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAccepted {
    pub received: bool,
    /// `false` when accepted without a signature check (no secret configured).
    pub verified: bool,
}

/// POST /webhooks/{platform}
pub async fn receive(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(params): Query<WebhookQuery>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAccepted>>> {
    let platform = WebhookPlatform::parse(&platform).ok_or_else(|| {
        AppError::BadRequest(format!("Unsupported webhook platform '{platform}'"))
    })?;

    let merchant_id = merchant_id_from_headers(&headers).or(params.merchant_id);
    let signature = headers
        .get(platform.signature_header())
        .and_then(|v| v.to_str().ok());

    let request = WebhookRequest {
        merchant_id,
        platform,
        payload: &body,
        signature,
        source_ip: source_ip(&headers, peer_addr(&extensions)),
        path: uri.path(),
        method: method.as_str(),
    };
    let result = state.verifier.verify(&request).await;
    if !result.valid {
        let reason = result.error.unwrap_or_else(|| "verification failed".to_string());
        return Err(AppError::Core(CoreError::Unauthorized(format!(
            "Invalid webhook signature: {reason}"
        ))));
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Webhook body is not valid JSON: {e}")))?;

    let mut event = PlatformEvent::new(EVENT_WEBHOOK_RECEIVED).with_payload(serde_json::json!({
        "platform": platform,
        "verified": !result.skipped,
        "body": payload,
    }));
    if let Some(merchant_id) = merchant_id {
        event = event.with_merchant(merchant_id);
    }
    state.event_bus.publish(event);

    tracing::info!(
        %platform,
        merchant_id = ?merchant_id,
        verified = !result.skipped,
        "Webhook accepted"
    );

    Ok(Json(DataResponse {
        data: WebhookAccepted {
            received: true,
            verified: !result.skipped,
        },
    }))
}

/// Socket peer, present when the server runs with connect info.
fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Client address as reported by the fronting proxy, else the socket peer.
fn source_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
