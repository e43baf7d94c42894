//! Integration tests for `POST /webhooks/{platform}`.

mod common;

use std::net::SocketAddr;

use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Method, StatusCode};
use common::{body_json, send};
use courier_core::signature::WebhookPlatform;
use courier_core::types::DbId;
use courier_events::{EngineConfig, VerificationMode};
use sqlx::PgPool;

const SECRET: &str = "whsec_api_test";
const BODY: &str = r#"{"event":"order.created","data":{"id":1001}}"#;

async fn add_integration(pool: &PgPool, merchant_id: DbId, platform: &str, secret: &str) {
    sqlx::query(
        "INSERT INTO merchant_integrations (merchant_id, platform, webhook_secret) \
         VALUES ($1, $2, $3)",
    )
    .bind(merchant_id)
    .bind(platform)
    .bind(secret)
    .execute(pool)
    .await
    .unwrap();
}

async fn post_webhook(
    app: axum::Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> axum::http::Response<axum::body::Body> {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    let payload = if json.is_null() { None } else { Some(json) };
    send(app, Method::POST, uri, headers, payload).await
}

async fn audit_rows(pool: &PgPool) -> Vec<(bool, Option<String>)> {
    sqlx::query_as("SELECT signature_valid, error FROM webhook_security_logs ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn valid_signature_is_accepted_and_audited(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Signed Store").await;
    add_integration(&pool, merchant, "salla", SECRET).await;
    let app = common::build_test_app(pool.clone());

    let body: serde_json::Value = serde_json::from_str(BODY).unwrap();
    let signature = WebhookPlatform::Salla.sign(SECRET, body.to_string().as_bytes());
    let merchant_header = merchant.to_string();
    let response = post_webhook(
        app,
        "/webhooks/salla",
        &[
            ("x-merchant-id", &merchant_header),
            ("x-salla-signature", &signature),
            ("x-forwarded-for", "203.0.113.9"),
        ],
        BODY,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["received"], true);
    assert_eq!(json["data"]["verified"], true);

    let rows = audit_rows(&pool).await;
    assert_eq!(rows, vec![(true, None)]);
    let ip: Option<String> = sqlx::query_scalar("SELECT source_ip FROM webhook_security_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ip.as_deref(), Some("203.0.113.9"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn direct_connection_is_audited_with_the_peer_address(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Direct Store").await;
    add_integration(&pool, merchant, "salla", SECRET).await;
    let peer = SocketAddr::from(([192, 0, 2, 44], 51000));
    let app = common::build_test_app(pool.clone()).layer(MockConnectInfo(peer));

    let signature = WebhookPlatform::Salla.sign("not-the-secret", BODY.as_bytes());
    let uri = format!("/webhooks/salla?merchant_id={merchant}");
    let response = post_webhook(app, &uri, &[("x-salla-signature", &signature)], BODY).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let ip: Option<String> = sqlx::query_scalar("SELECT source_ip FROM webhook_security_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ip.as_deref(), Some("192.0.2.44"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tampered_signature_is_rejected_with_401(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Signed Store").await;
    add_integration(&pool, merchant, "zid", SECRET).await;
    let app = common::build_test_app(pool.clone());

    let signature = WebhookPlatform::Zid.sign("not-the-secret", BODY.as_bytes());
    let uri = format!("/webhooks/zid?merchant_id={merchant}");
    let response = post_webhook(app, &uri, &[("x-zid-signature", &signature)], BODY).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");

    let rows = audit_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].0);
    assert!(rows[0].1.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_signature_is_rejected(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Store").await;
    let app = common::build_test_app(pool.clone());

    let merchant_header = merchant.to_string();
    let response =
        post_webhook(app, "/webhooks/salla", &[("x-merchant-id", &merchant_header)], BODY).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(audit_rows(&pool).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn permissive_mode_accepts_merchant_without_secret(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Unconfigured Store").await;
    let app = common::build_test_app(pool.clone());

    let merchant_header = merchant.to_string();
    let response = post_webhook(
        app,
        "/webhooks/salla",
        &[
            ("x-merchant-id", &merchant_header),
            ("x-salla-signature", "deadbeef"),
        ],
        BODY,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], false);

    let rows = audit_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn strict_mode_rejects_merchant_without_secret(pool: PgPool) {
    let merchant = common::seed_merchant(&pool, "Unconfigured Store").await;
    let engine = EngineConfig {
        verification_mode: VerificationMode::Strict,
        ..EngineConfig::default()
    };
    let app = common::build_test_app_with(pool.clone(), engine);

    let merchant_header = merchant.to_string();
    let response = post_webhook(
        app,
        "/webhooks/salla",
        &[
            ("x-merchant-id", &merchant_header),
            ("x-salla-signature", "deadbeef"),
        ],
        BODY,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let rows = audit_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_platform_is_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_webhook(app, "/webhooks/shopify", &[], BODY).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(audit_rows(&pool).await.is_empty());
}
