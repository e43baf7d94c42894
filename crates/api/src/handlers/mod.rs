pub mod admin;
pub mod notification;
pub mod reports;
pub mod webhooks;
