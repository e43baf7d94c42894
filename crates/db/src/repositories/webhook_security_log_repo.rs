//! Repository for the append-only `webhook_security_logs` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::webhook_security::{NewWebhookSecurityLog, WebhookSecurityLog};

const COLUMNS: &str = "id, merchant_id, platform, source_ip, signature_valid, \
    request_path, request_method, error, created_at";

pub struct WebhookSecurityLogRepo;

impl WebhookSecurityLogRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewWebhookSecurityLog,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO webhook_security_logs \
                (merchant_id, platform, source_ip, signature_valid, \
                 request_path, request_method, error) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(input.merchant_id)
        .bind(&input.platform)
        .bind(&input.source_ip)
        .bind(input.signature_valid)
        .bind(&input.request_path)
        .bind(&input.request_method)
        .bind(&input.error)
        .fetch_one(pool)
        .await
    }

    /// Page through audit rows, newest first, optionally for one merchant
    /// and optionally only failed checks.
    pub async fn list(
        pool: &PgPool,
        merchant_id: Option<DbId>,
        invalid_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookSecurityLog>, sqlx::Error> {
        let filter = if invalid_only {
            "AND signature_valid = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM webhook_security_logs \
             WHERE ($1::BIGINT IS NULL OR merchant_id = $1) {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WebhookSecurityLog>(&query)
            .bind(merchant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
