//! Merchant-defined recurring reports.

use courier_core::channels::ReportDeliveryMethod;
use courier_core::error::CoreError;
use courier_core::recurrence::{Recurrence, ReportSchedule};
use courier_core::report::ContentFlags;
use courier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `scheduled_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduledReport {
    pub id: DbId,
    pub merchant_id: DbId,
    pub name: String,
    pub recurrence: String,
    pub schedule_day: Option<i16>,
    pub schedule_time: String,
    pub delivery_method: String,
    pub recipient_emails: Vec<String>,
    pub recipient_phone: Option<String>,
    pub include_conversations: bool,
    pub include_orders: bool,
    pub include_revenue: bool,
    pub include_customers: bool,
    pub is_active: bool,
    pub last_sent_at: Option<Timestamp>,
    pub next_send_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScheduledReport {
    /// Validated recurrence rule from the stored columns.
    pub fn schedule(&self) -> Result<ReportSchedule, CoreError> {
        ReportSchedule::parse(&self.recurrence, self.schedule_day, &self.schedule_time)
    }

    /// Metrics window length; unknown recurrences fall back to a week.
    pub fn trailing_days(&self) -> u32 {
        Recurrence::parse(&self.recurrence)
            .map(Recurrence::trailing_days)
            .unwrap_or(7)
    }

    pub fn delivery_method(&self) -> Result<ReportDeliveryMethod, CoreError> {
        ReportDeliveryMethod::parse(&self.delivery_method).ok_or_else(|| {
            CoreError::Validation(format!(
                "unknown delivery method '{}'",
                self.delivery_method
            ))
        })
    }

    pub fn content_flags(&self) -> ContentFlags {
        ContentFlags {
            conversations: self.include_conversations,
            orders: self.include_orders,
            revenue: self.include_revenue,
            customers: self.include_customers,
        }
    }
}

/// DTO for creating a scheduled report.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduledReport {
    pub name: String,
    pub recurrence: Recurrence,
    pub schedule_day: Option<i16>,
    pub schedule_time: String,
    pub delivery_method: ReportDeliveryMethod,
    #[serde(default)]
    pub recipient_emails: Vec<String>,
    pub recipient_phone: Option<String>,
    pub include_conversations: Option<bool>,
    pub include_orders: Option<bool>,
    pub include_revenue: Option<bool>,
    pub include_customers: Option<bool>,
    pub is_active: Option<bool>,
}

/// DTO for updating a scheduled report. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduledReport {
    pub name: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub schedule_day: Option<i16>,
    pub schedule_time: Option<String>,
    pub delivery_method: Option<ReportDeliveryMethod>,
    pub recipient_emails: Option<Vec<String>>,
    pub recipient_phone: Option<String>,
    pub include_conversations: Option<bool>,
    pub include_orders: Option<bool>,
    pub include_revenue: Option<bool>,
    pub include_customers: Option<bool>,
    pub is_active: Option<bool>,
}
