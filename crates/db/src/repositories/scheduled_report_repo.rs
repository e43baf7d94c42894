//! Repository for the `scheduled_reports` table.

use courier_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::scheduled_report::{
    CreateScheduledReport, ScheduledReport, UpdateScheduledReport,
};

const COLUMNS: &str = "id, merchant_id, name, recurrence, schedule_day, schedule_time, \
    delivery_method, recipient_emails, recipient_phone, include_conversations, include_orders, \
    include_revenue, include_customers, is_active, last_sent_at, next_send_at, \
    created_at, updated_at";

pub struct ScheduledReportRepo;

impl ScheduledReportRepo {
    /// Insert a report with its initial `next_send_at`.
    pub async fn create(
        pool: &PgPool,
        merchant_id: DbId,
        input: &CreateScheduledReport,
        next_send_at: Option<Timestamp>,
    ) -> Result<ScheduledReport, sqlx::Error> {
        let query = format!(
            "INSERT INTO scheduled_reports \
                (merchant_id, name, recurrence, schedule_day, schedule_time, delivery_method, \
                 recipient_emails, recipient_phone, include_conversations, include_orders, \
                 include_revenue, include_customers, is_active, next_send_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, true), COALESCE($10, true), \
                 COALESCE($11, true), COALESCE($12, true), COALESCE($13, true), $14) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(merchant_id)
            .bind(&input.name)
            .bind(input.recurrence.as_str())
            .bind(input.schedule_day)
            .bind(&input.schedule_time)
            .bind(input.delivery_method.as_str())
            .bind(&input.recipient_emails)
            .bind(&input.recipient_phone)
            .bind(input.include_conversations)
            .bind(input.include_orders)
            .bind(input.include_revenue)
            .bind(input.include_customers)
            .bind(input.is_active)
            .bind(next_send_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ScheduledReport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scheduled_reports WHERE id = $1");
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a report only if it belongs to `merchant_id`.
    pub async fn find_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
        id: DbId,
    ) -> Result<Option<ScheduledReport>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM scheduled_reports WHERE id = $1 AND merchant_id = $2");
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(id)
            .bind(merchant_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Vec<ScheduledReport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scheduled_reports WHERE merchant_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(merchant_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. `next_send_at` is written only when `Some`,
    /// which callers do whenever the recurrence fields change.
    pub async fn update(
        pool: &PgPool,
        merchant_id: DbId,
        id: DbId,
        input: &UpdateScheduledReport,
        next_send_at: Option<Timestamp>,
    ) -> Result<Option<ScheduledReport>, sqlx::Error> {
        let query = format!(
            "UPDATE scheduled_reports SET \
                name = COALESCE($3, name), \
                recurrence = COALESCE($4, recurrence), \
                schedule_day = COALESCE($5, schedule_day), \
                schedule_time = COALESCE($6, schedule_time), \
                delivery_method = COALESCE($7, delivery_method), \
                recipient_emails = COALESCE($8, recipient_emails), \
                recipient_phone = COALESCE($9, recipient_phone), \
                include_conversations = COALESCE($10, include_conversations), \
                include_orders = COALESCE($11, include_orders), \
                include_revenue = COALESCE($12, include_revenue), \
                include_customers = COALESCE($13, include_customers), \
                is_active = COALESCE($14, is_active), \
                next_send_at = COALESCE($15, next_send_at), \
                updated_at = NOW() \
             WHERE id = $1 AND merchant_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(id)
            .bind(merchant_id)
            .bind(&input.name)
            .bind(input.recurrence.map(|r| r.as_str()))
            .bind(input.schedule_day)
            .bind(&input.schedule_time)
            .bind(input.delivery_method.map(|m| m.as_str()))
            .bind(&input.recipient_emails)
            .bind(&input.recipient_phone)
            .bind(input.include_conversations)
            .bind(input.include_orders)
            .bind(input.include_revenue)
            .bind(input.include_customers)
            .bind(input.is_active)
            .bind(next_send_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, merchant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scheduled_reports WHERE id = $1 AND merchant_id = $2")
            .bind(id)
            .bind(merchant_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active reports that have never been scheduled or whose next run has
    /// passed, oldest first.
    pub async fn list_due(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<ScheduledReport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scheduled_reports \
             WHERE is_active = true AND (next_send_at IS NULL OR next_send_at <= $1) \
             ORDER BY next_send_at ASC NULLS FIRST, id ASC"
        );
        sqlx::query_as::<_, ScheduledReport>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Atomically take ownership of a due report by moving its `next_send_at`
    /// to `lease_until`. Returns `false` if another worker got there first.
    pub async fn claim(
        pool: &PgPool,
        id: DbId,
        observed_next_send_at: Option<Timestamp>,
        lease_until: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scheduled_reports SET next_send_at = $3, updated_at = NOW() \
             WHERE id = $1 AND is_active = true \
               AND next_send_at IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(observed_next_send_at)
        .bind(lease_until)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a run: stamp `last_sent_at` and store the next run time.
    pub async fn mark_processed(
        pool: &PgPool,
        id: DbId,
        sent_at: Timestamp,
        next_send_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scheduled_reports \
             SET last_sent_at = $2, next_send_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(sent_at)
        .bind(next_send_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
