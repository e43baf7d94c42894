#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use courier_api::config::ServerConfig;
use courier_api::router::build_app_router;
use courier_api::state::{AppState, Transports};
use courier_core::types::DbId;
use courier_events::EngineConfig;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        log_json: false,
    }
}

/// Build the full application router over `pool` with the default engine
/// configuration (permissive webhook checks) and no outbound transports.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, EngineConfig::default())
}

pub fn build_test_app_with(pool: PgPool, engine: EngineConfig) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), &engine, Transports::default());
    build_app_router(state, &config)
}

/// Insert a merchant row and return its id.
pub async fn seed_merchant(pool: &PgPool, name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO merchants (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, &[], None).await
}

/// GET acting as merchant `merchant_id`.
pub async fn get_as(app: Router, merchant_id: DbId, uri: &str) -> Response<Body> {
    let id = merchant_id.to_string();
    send(app, Method::GET, uri, &[("x-merchant-id", &id)], None).await
}

pub async fn post_as(
    app: Router,
    merchant_id: DbId,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let id = merchant_id.to_string();
    send(app, Method::POST, uri, &[("x-merchant-id", &id)], Some(body)).await
}

pub async fn put_as(
    app: Router,
    merchant_id: DbId,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let id = merchant_id.to_string();
    send(app, Method::PUT, uri, &[("x-merchant-id", &id)], Some(body)).await
}

pub async fn delete_as(app: Router, merchant_id: DbId, uri: &str) -> Response<Body> {
    let id = merchant_id.to_string();
    send(app, Method::DELETE, uri, &[("x-merchant-id", &id)], None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
