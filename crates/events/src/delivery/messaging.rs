//! Plain-text chat delivery through an HTTP messaging gateway.

use async_trait::async_trait;

use super::MessageSender;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Messaging gateway returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Messaging request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// | Variable                  | Required |
/// |---------------------------|----------|
/// | `MESSAGING_GATEWAY_URL`   | yes      |
/// | `MESSAGING_GATEWAY_TOKEN` | no       |
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub gateway_url: String,
    pub token: Option<String>,
}

impl MessagingConfig {
    /// Returns `None` when `MESSAGING_GATEWAY_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let gateway_url = std::env::var("MESSAGING_GATEWAY_URL")
            .ok()
            .filter(|u| !u.is_empty())?;
        Some(Self {
            gateway_url,
            token: std::env::var("MESSAGING_GATEWAY_TOKEN").ok(),
        })
    }
}

pub struct HttpMessageSender {
    client: reqwest::Client,
    config: MessagingConfig,
}

impl HttpMessageSender {
    pub fn new(config: MessagingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl MessageSender for HttpMessageSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MessagingError> {
        let mut request = self
            .client
            .post(&self.config.gateway_url)
            .json(&serde_json::json!({ "to": to, "type": "text", "text": text }));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MessagingError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(to, "Chat message sent");
        Ok(())
    }
}
