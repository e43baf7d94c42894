//! Web-push delivery through an HTTP push gateway.
//!
//! The gateway owns VAPID signing and payload encryption; this sender posts
//! the subscription keys and the notification body to it. A 404 or 410 from
//! the gateway means the browser endpoint no longer exists and surfaces as
//! [`PushError::Gone`].

use std::time::Duration;

use async_trait::async_trait;
use courier_db::models::push_subscription::PushSubscription;
use reqwest::StatusCode;

use super::{PushMessage, PushSender};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The endpoint is permanently gone; the subscription should be retired.
    #[error("Push endpoint gone (HTTP {0})")]
    Gone(u16),

    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl PushError {
    pub fn is_gone(&self) -> bool {
        matches!(self, PushError::Gone(_))
    }

    /// Classify a non-success gateway status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => PushError::Gone(status.as_u16()),
            other => PushError::HttpStatus(other.as_u16()),
        }
    }
}

/// | Variable             | Required | Default |
/// |----------------------|----------|---------|
/// | `PUSH_GATEWAY_URL`   | yes      | -       |
/// | `PUSH_GATEWAY_TOKEN` | no       | -       |
/// | `PUSH_TIMEOUT_SECS`  | no       | `10`    |
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub gateway_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl PushConfig {
    /// Returns `None` when `PUSH_GATEWAY_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let gateway_url = std::env::var("PUSH_GATEWAY_URL").ok().filter(|u| !u.is_empty())?;
        Some(Self {
            gateway_url,
            token: std::env::var("PUSH_GATEWAY_TOKEN").ok(),
            timeout: Duration::from_secs(
                std::env::var("PUSH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

pub struct HttpPushSender {
    client: reqwest::Client,
    config: PushConfig,
}

impl HttpPushSender {
    pub fn new(config: PushConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        let body = serde_json::json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": { "p256dh": subscription.p256dh, "auth": subscription.auth },
            },
            "notification": message,
        });

        let mut request = self.client.post(&self.config.gateway_url).json(&body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PushError::from_status(response.status()));
        }
        Ok(())
    }
}
