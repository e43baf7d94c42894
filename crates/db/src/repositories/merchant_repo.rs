//! Read-only accessors on the external `merchants` and
//! `merchant_integrations` tables.

use courier_core::types::DbId;
use sqlx::PgPool;

pub struct MerchantRepo;

impl MerchantRepo {
    /// The address notification emails go to, if the merchant has one.
    pub async fn notification_email(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT notification_email FROM merchants WHERE id = $1")
                .bind(merchant_id)
                .fetch_optional(pool)
                .await?;
        Ok(email.flatten().filter(|e| !e.trim().is_empty()))
    }

    pub async fn list_active_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM merchants WHERE is_active = true ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// The webhook secret configured for a merchant's platform integration.
    /// A blank secret counts as not configured.
    pub async fn webhook_secret(
        pool: &PgPool,
        merchant_id: DbId,
        platform: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let secret: Option<Option<String>> = sqlx::query_scalar(
            "SELECT webhook_secret FROM merchant_integrations \
             WHERE merchant_id = $1 AND platform = $2",
        )
        .bind(merchant_id)
        .bind(platform)
        .fetch_optional(pool)
        .await?;
        Ok(secret.flatten().filter(|s| !s.is_empty()))
    }
}
