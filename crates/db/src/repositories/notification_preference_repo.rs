//! Repository for the `notification_preferences` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{NotificationPreference, UpdateNotificationPreference};

const COLUMNS: &str = "id, merchant_id, new_order_enabled, new_message_enabled, \
    appointment_enabled, order_status_enabled, missed_message_enabled, disconnect_alert_enabled, \
    low_stock_enabled, weekly_digest_enabled, preferred_channel, quiet_hours_enabled, \
    quiet_hours_start, quiet_hours_end, batching_enabled, batch_interval_minutes, \
    created_at, updated_at";

/// Per-merchant notification preferences. A merchant without a row gets
/// the column defaults.
pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    pub async fn find_by_merchant(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Option<NotificationPreference>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notification_preferences WHERE merchant_id = $1");
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(merchant_id)
            .fetch_optional(pool)
            .await
    }

    /// Return the merchant's row, inserting one with defaults if absent.
    ///
    /// An existing row is only read, never rewritten.
    pub async fn get_or_create(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<NotificationPreference, sqlx::Error> {
        if let Some(existing) = Self::find_by_merchant(pool, merchant_id).await? {
            return Ok(existing);
        }

        sqlx::query(
            "INSERT INTO notification_preferences (merchant_id) VALUES ($1) \
             ON CONFLICT (merchant_id) DO NOTHING",
        )
        .bind(merchant_id)
        .execute(pool)
        .await?;

        // A concurrent insert may have won; either way the row now exists.
        let query =
            format!("SELECT {COLUMNS} FROM notification_preferences WHERE merchant_id = $1");
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(merchant_id)
            .fetch_one(pool)
            .await
    }

    /// Insert or update preferences.
    ///
    /// Uses `COALESCE` to only overwrite fields that are `Some` in the input.
    pub async fn upsert(
        pool: &PgPool,
        merchant_id: DbId,
        input: &UpdateNotificationPreference,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences \
                (merchant_id, new_order_enabled, new_message_enabled, appointment_enabled, \
                 order_status_enabled, missed_message_enabled, disconnect_alert_enabled, \
                 low_stock_enabled, weekly_digest_enabled, preferred_channel, \
                 quiet_hours_enabled, quiet_hours_start, quiet_hours_end, \
                 batching_enabled, batch_interval_minutes) \
             VALUES ($1, COALESCE($2, true), COALESCE($3, true), COALESCE($4, true), \
                 COALESCE($5, true), COALESCE($6, true), COALESCE($7, true), \
                 COALESCE($8, true), COALESCE($9, true), COALESCE($10, 'both'), \
                 COALESCE($11, false), COALESCE($12, '22:00'), COALESCE($13, '08:00'), \
                 COALESCE($14, false), COALESCE($15, 15)) \
             ON CONFLICT (merchant_id) DO UPDATE SET \
                new_order_enabled = COALESCE($2, notification_preferences.new_order_enabled), \
                new_message_enabled = COALESCE($3, notification_preferences.new_message_enabled), \
                appointment_enabled = COALESCE($4, notification_preferences.appointment_enabled), \
                order_status_enabled = COALESCE($5, notification_preferences.order_status_enabled), \
                missed_message_enabled = COALESCE($6, notification_preferences.missed_message_enabled), \
                disconnect_alert_enabled = COALESCE($7, notification_preferences.disconnect_alert_enabled), \
                low_stock_enabled = COALESCE($8, notification_preferences.low_stock_enabled), \
                weekly_digest_enabled = COALESCE($9, notification_preferences.weekly_digest_enabled), \
                preferred_channel = COALESCE($10, notification_preferences.preferred_channel), \
                quiet_hours_enabled = COALESCE($11, notification_preferences.quiet_hours_enabled), \
                quiet_hours_start = COALESCE($12, notification_preferences.quiet_hours_start), \
                quiet_hours_end = COALESCE($13, notification_preferences.quiet_hours_end), \
                batching_enabled = COALESCE($14, notification_preferences.batching_enabled), \
                batch_interval_minutes = COALESCE($15, notification_preferences.batch_interval_minutes), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(merchant_id)
            .bind(input.new_order_enabled)
            .bind(input.new_message_enabled)
            .bind(input.appointment_enabled)
            .bind(input.order_status_enabled)
            .bind(input.missed_message_enabled)
            .bind(input.disconnect_alert_enabled)
            .bind(input.low_stock_enabled)
            .bind(input.weekly_digest_enabled)
            .bind(input.preferred_channel.map(|c| c.as_str()))
            .bind(input.quiet_hours_enabled)
            .bind(&input.quiet_hours_start)
            .bind(&input.quiet_hours_end)
            .bind(input.batching_enabled)
            .bind(input.batch_interval_minutes)
            .fetch_one(pool)
            .await
    }
}
