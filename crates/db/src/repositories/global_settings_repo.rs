//! Repository for the singleton `global_notification_settings` row.

use sqlx::PgPool;

use crate::models::notification::{GlobalNotificationSettings, UpdateGlobalSettings};

const COLUMNS: &str = "id, new_order_enabled, new_message_enabled, appointment_enabled, \
    order_status_enabled, missed_message_enabled, disconnect_alert_enabled, low_stock_enabled, \
    weekly_digest_enabled, weekly_report_day, weekly_report_time, created_at, updated_at";

pub struct GlobalSettingsRepo;

impl GlobalSettingsRepo {
    /// Load the settings row, creating it with defaults if it is missing.
    ///
    /// An existing row is only read, never rewritten.
    pub async fn get(pool: &PgPool) -> Result<GlobalNotificationSettings, sqlx::Error> {
        let select = format!("SELECT {COLUMNS} FROM global_notification_settings WHERE id = 1");
        if let Some(settings) = sqlx::query_as::<_, GlobalNotificationSettings>(&select)
            .fetch_optional(pool)
            .await?
        {
            return Ok(settings);
        }

        sqlx::query(
            "INSERT INTO global_notification_settings (id) VALUES (1) \
             ON CONFLICT (id) DO NOTHING",
        )
        .execute(pool)
        .await?;

        sqlx::query_as::<_, GlobalNotificationSettings>(&select)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update. Fields that are `None` keep their value.
    pub async fn update(
        pool: &PgPool,
        input: &UpdateGlobalSettings,
    ) -> Result<GlobalNotificationSettings, sqlx::Error> {
        // Make sure the row exists before the UPDATE.
        Self::get(pool).await?;

        let query = format!(
            "UPDATE global_notification_settings SET \
                new_order_enabled = COALESCE($1, new_order_enabled), \
                new_message_enabled = COALESCE($2, new_message_enabled), \
                appointment_enabled = COALESCE($3, appointment_enabled), \
                order_status_enabled = COALESCE($4, order_status_enabled), \
                missed_message_enabled = COALESCE($5, missed_message_enabled), \
                disconnect_alert_enabled = COALESCE($6, disconnect_alert_enabled), \
                low_stock_enabled = COALESCE($7, low_stock_enabled), \
                weekly_digest_enabled = COALESCE($8, weekly_digest_enabled), \
                weekly_report_day = COALESCE($9, weekly_report_day), \
                weekly_report_time = COALESCE($10, weekly_report_time), \
                updated_at = NOW() \
             WHERE id = 1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GlobalNotificationSettings>(&query)
            .bind(input.new_order_enabled)
            .bind(input.new_message_enabled)
            .bind(input.appointment_enabled)
            .bind(input.order_status_enabled)
            .bind(input.missed_message_enabled)
            .bind(input.disconnect_alert_enabled)
            .bind(input.low_stock_enabled)
            .bind(input.weekly_digest_enabled)
            .bind(input.weekly_report_day)
            .bind(&input.weekly_report_time)
            .fetch_one(pool)
            .await
    }
}
