//! Repository for `notification_logs` and `push_notification_logs`.
//!
//! A log row is created `pending` and moved to exactly one terminal status.
//! The terminal updates only match `pending` rows so a completed row is
//! never rewritten.

use courier_core::delivery::{DeliveryStatus, STATUS_PENDING};
use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{NewNotificationLog, NotificationLog, PushNotificationLog};

const COLUMNS: &str =
    "id, merchant_id, notification_type, channel, title, body, status, error, sent_at, created_at";

const PUSH_COLUMNS: &str =
    "id, notification_log_id, subscription_id, merchant_id, status, error, sent_at, created_at";

pub struct NotificationLogRepo;

impl NotificationLogRepo {
    /// Insert a `pending` row, returning its ID.
    pub async fn create_pending(
        pool: &PgPool,
        input: &NewNotificationLog,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_logs \
                (merchant_id, notification_type, channel, title, body, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(input.merchant_id)
        .bind(input.notification_type.as_str())
        .bind(input.channel.as_str())
        .bind(&input.title)
        .bind(&input.body)
        .bind(STATUS_PENDING)
        .fetch_one(pool)
        .await
    }

    /// Move a pending row to `sent` or `failed`.
    ///
    /// Returns `false` if the row was not pending.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let status = DeliveryStatus::from_outcome(succeeded);
        let result = sqlx::query(
            "UPDATE notification_logs \
             SET status = $2, error = $3, \
                 sent_at = CASE WHEN $4 THEN NOW() ELSE NULL END \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .bind(succeeded)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<NotificationLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_logs WHERE id = $1");
        sqlx::query_as::<_, NotificationLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a merchant's logs, newest first.
    pub async fn list_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_logs \
             WHERE merchant_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, NotificationLog>(&query)
            .bind(merchant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Record one push attempt against one subscription.
    pub async fn record_push_attempt(
        pool: &PgPool,
        notification_log_id: Option<DbId>,
        subscription_id: DbId,
        merchant_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        let status = DeliveryStatus::from_outcome(succeeded);
        sqlx::query_scalar(
            "INSERT INTO push_notification_logs \
                (notification_log_id, subscription_id, merchant_id, status, error, sent_at) \
             VALUES ($1, $2, $3, $4, $5, CASE WHEN $6 THEN NOW() ELSE NULL END) \
             RETURNING id",
        )
        .bind(notification_log_id)
        .bind(subscription_id)
        .bind(merchant_id)
        .bind(status.as_str())
        .bind(error)
        .bind(succeeded)
        .fetch_one(pool)
        .await
    }

    pub async fn list_push_attempts(
        pool: &PgPool,
        notification_log_id: DbId,
    ) -> Result<Vec<PushNotificationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {PUSH_COLUMNS} FROM push_notification_logs \
             WHERE notification_log_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, PushNotificationLog>(&query)
            .bind(notification_log_id)
            .fetch_all(pool)
            .await
    }
}
