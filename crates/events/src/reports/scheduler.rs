//! Background loop for scheduled reports and the weekly digest.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use super::{ReportEngine, WeeklyDigest};

/// Runs [`ReportEngine::process_due`] every `interval`, starting
/// immediately, and fires the weekly digest when its slot arrives.
pub struct ReportScheduler {
    engine: Arc<ReportEngine>,
    digest: Option<Arc<WeeklyDigest>>,
    interval: Duration,
}

impl ReportScheduler {
    pub fn new(engine: Arc<ReportEngine>, interval: Duration) -> Self {
        Self {
            engine,
            digest: None,
            interval,
        }
    }

    pub fn with_digest(mut self, digest: Arc<WeeklyDigest>) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Run until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut digest_sent_on: Option<NaiveDate> = None;

        tracing::info!(interval_secs = self.interval.as_secs(), "Report scheduler started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Report scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let now = Utc::now();
                    self.engine.process_due_at(now).await;
                    if let Some(digest) = &self.digest {
                        digest.run_if_due(now, &mut digest_sent_on).await;
                    }
                }
            }
        }
    }
}
