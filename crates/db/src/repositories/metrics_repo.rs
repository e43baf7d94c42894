//! Aggregate business counts for report content.

use courier_core::report::ReportMetrics;
use courier_core::types::{DbId, Timestamp};
use sqlx::PgPool;

pub struct MetricsRepo;

impl MetricsRepo {
    /// Counts for one merchant over `[since, now]`.
    pub async fn report_metrics(
        pool: &PgPool,
        merchant_id: DbId,
        since: Timestamp,
    ) -> Result<ReportMetrics, sqlx::Error> {
        let (conversations, messages, orders, revenue, new_customers) =
            sqlx::query_as::<_, (i64, i64, i64, f64, i64)>(
                "SELECT \
                    (SELECT COUNT(*) FROM conversations \
                      WHERE merchant_id = $1 AND created_at >= $2), \
                    (SELECT COUNT(*) FROM messages m \
                      JOIN conversations c ON c.id = m.conversation_id \
                      WHERE c.merchant_id = $1 AND m.created_at >= $2), \
                    (SELECT COUNT(*) FROM orders \
                      WHERE merchant_id = $1 AND created_at >= $2), \
                    (SELECT COALESCE(SUM(total), 0)::FLOAT8 FROM orders \
                      WHERE merchant_id = $1 AND created_at >= $2), \
                    (SELECT COUNT(*) FROM customers \
                      WHERE merchant_id = $1 AND created_at >= $2)",
            )
            .bind(merchant_id)
            .bind(since)
            .fetch_one(pool)
            .await?;

        Ok(ReportMetrics {
            conversations,
            messages,
            orders,
            revenue,
            new_customers,
        })
    }
}
