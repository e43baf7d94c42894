pub mod notification;
pub mod push_subscription;
pub mod scheduled_report;
pub mod webhook_security;
