//! Scheduled reports and the weekly digest.
//!
//! - [`ReportEngine`]: the due-check / generate / deliver / reschedule cycle.
//! - [`WeeklyDigest`]: platform-wide weekly summary sent through the
//!   notification dispatcher.
//! - [`ReportScheduler`]: background loop driving both.

pub mod content;
pub mod digest;
pub mod engine;
pub mod scheduler;

use courier_core::error::CoreError;
use courier_core::types::DbId;
use serde::Serialize;

pub use digest::WeeklyDigest;
pub use engine::ReportEngine;
pub use scheduler::ReportScheduler;

/// Aggregate counts from one [`ReportEngine::process_due`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportRunSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Due reports another worker claimed first.
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Scheduled report {0} not found")]
    NotFound(DbId),

    #[error("Storage error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Neither a recipient nor a transport was available for any channel.
    #[error("No delivery target for report {0}")]
    NoDeliveryTarget(DbId),

    #[error("Report {0} timed out")]
    Timeout(DbId),
}
