//! Repository for the `push_subscriptions` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::push_subscription::{CreatePushSubscription, PushSubscription};

const COLUMNS: &str =
    "id, merchant_id, endpoint, p256dh, auth, user_agent, is_active, created_at, updated_at";

pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// Register an endpoint. Re-registering one of the merchant's own
    /// endpoints refreshes its keys and reactivates it.
    ///
    /// Returns `None` when the endpoint belongs to another merchant; the
    /// existing row is left untouched.
    pub async fn upsert(
        pool: &PgPool,
        merchant_id: DbId,
        input: &CreatePushSubscription,
    ) -> Result<Option<PushSubscription>, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_subscriptions (merchant_id, endpoint, p256dh, auth, user_agent) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (endpoint) DO UPDATE SET \
                p256dh = EXCLUDED.p256dh, \
                auth = EXCLUDED.auth, \
                user_agent = EXCLUDED.user_agent, \
                is_active = true, \
                updated_at = NOW() \
             WHERE push_subscriptions.merchant_id = EXCLUDED.merchant_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(merchant_id)
            .bind(&input.endpoint)
            .bind(&input.p256dh)
            .bind(&input.auth)
            .bind(&input.user_agent)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_active(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_subscriptions \
             WHERE merchant_id = $1 AND is_active = true \
             ORDER BY id"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(merchant_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a subscription inactive. Returns `true` if a row changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE push_subscriptions SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a merchant's subscription. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, merchant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE id = $1 AND merchant_id = $2")
                .bind(id)
                .bind(merchant_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
