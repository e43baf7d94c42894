//! Audit rows for inbound webhook signature checks.

use courier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `webhook_security_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookSecurityLog {
    pub id: DbId,
    pub merchant_id: Option<DbId>,
    pub platform: String,
    pub source_ip: Option<String>,
    pub signature_valid: bool,
    pub request_path: String,
    pub request_method: String,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

/// Insert DTO for one verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookSecurityLog {
    pub merchant_id: Option<DbId>,
    pub platform: String,
    pub source_ip: Option<String>,
    pub signature_valid: bool,
    pub request_path: String,
    pub request_method: String,
    pub error: Option<String>,
}
