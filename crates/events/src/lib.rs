//! Courier notification engine.
//!
//! - [`EventBus`]: in-process publish/subscribe hub; the observability sink
//!   for dispatch outcomes and the hand-off point for verified webhooks.
//! - [`store`]: the storage collaborator traits the engine depends on, with
//!   [`PgStore`] as the PostgreSQL implementation.
//! - [`delivery`]: push, email, and messaging transports.
//! - [`PreferenceResolver`]: global kill-switches, merchant opt-outs, and
//!   quiet hours folded into one send/skip decision.
//! - [`Dispatcher`]: multi-channel fan-out with per-channel outcome logging.
//! - [`reports`]: scheduled-report engine, weekly digest, and the
//!   background scheduler that drives both.
//! - [`WebhookVerifier`]: HMAC gate and audit trail for inbound webhooks.

pub mod bus;
pub mod config;
pub mod delivery;
pub mod delivery_log;
pub mod dispatcher;
pub mod pg_store;
pub mod preferences;
pub mod reports;
pub mod store;
pub mod webhook_verify;

pub use bus::{EventBus, PlatformEvent};
pub use config::EngineConfig;
pub use delivery_log::DeliveryLogger;
pub use dispatcher::{DispatchOutcome, Dispatcher, NotificationPayload};
pub use pg_store::PgStore;
pub use preferences::{DispatchDecision, GlobalSettingsCache, PreferenceResolver, SkipReason};
pub use reports::{ReportEngine, ReportRunSummary, ReportScheduler, WeeklyDigest};
pub use webhook_verify::{VerificationMode, VerificationResult, WebhookRequest, WebhookVerifier};
