//! Delivery logging.
//!
//! [`DeliveryLogger::begin`] writes a `pending` row and hands back a
//! [`PendingDelivery`]. Completing consumes the handle, so a dispatch can
//! finalise its row exactly once; the repository update is also conditional
//! on the row still being pending.

use std::sync::Arc;

use courier_core::types::DbId;
use courier_db::models::notification::NewNotificationLog;

use crate::store::{NotificationStore, StoreResult};

/// A `pending` notification log row awaiting its terminal status.
#[derive(Debug)]
#[must_use = "a pending delivery must be completed"]
pub struct PendingDelivery {
    log_id: DbId,
}

impl PendingDelivery {
    pub fn log_id(&self) -> DbId {
        self.log_id
    }
}

pub struct DeliveryLogger {
    store: Arc<dyn NotificationStore>,
}

impl DeliveryLogger {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn begin(&self, entry: &NewNotificationLog) -> StoreResult<PendingDelivery> {
        let log_id = self.store.create_pending_log(entry).await?;
        Ok(PendingDelivery { log_id })
    }

    /// Move the row to `sent` or `failed`.
    pub async fn complete(
        &self,
        pending: PendingDelivery,
        succeeded: bool,
        error: Option<&str>,
    ) -> StoreResult<()> {
        let updated = self
            .store
            .complete_log(pending.log_id, succeeded, error)
            .await?;
        if !updated {
            tracing::warn!(log_id = pending.log_id, "Notification log was not pending");
        }
        Ok(())
    }

    /// Record one push attempt. Failures to write are logged, not returned.
    pub async fn record_push_attempt(
        &self,
        pending: Option<&PendingDelivery>,
        subscription_id: DbId,
        merchant_id: DbId,
        succeeded: bool,
        error: Option<&str>,
    ) {
        let log_id = pending.map(PendingDelivery::log_id);
        if let Err(e) = self
            .store
            .record_push_attempt(log_id, subscription_id, merchant_id, succeeded, error)
            .await
        {
            tracing::error!(subscription_id, error = %e, "Failed to record push attempt");
        }
    }
}
