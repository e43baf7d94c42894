//! One zero-sized repository struct per table. Every method takes `&PgPool`.

pub mod global_settings_repo;
pub mod merchant_repo;
pub mod metrics_repo;
pub mod notification_log_repo;
pub mod notification_preference_repo;
pub mod push_subscription_repo;
pub mod scheduled_report_repo;
pub mod webhook_security_log_repo;

pub use global_settings_repo::GlobalSettingsRepo;
pub use merchant_repo::MerchantRepo;
pub use metrics_repo::MetricsRepo;
pub use notification_log_repo::NotificationLogRepo;
pub use notification_preference_repo::NotificationPreferenceRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
pub use scheduled_report_repo::ScheduledReportRepo;
pub use webhook_security_log_repo::WebhookSecurityLogRepo;
