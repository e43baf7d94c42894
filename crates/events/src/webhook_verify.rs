//! Inbound webhook signature verification with an audit trail.
//!
//! Checks run in order:
//! 1. a signature header must be present,
//! 2. a merchant id must be resolvable,
//! 3. the merchant's platform secret is looked up,
//! 4. the HMAC-SHA256 of the raw body is compared in constant time.
//!
//! When no secret is configured the outcome depends on [`VerificationMode`]:
//! `Permissive` accepts the request and marks it skipped, `Strict` rejects
//! it. A failed secret lookup always rejects. Every attempt appends one
//! `webhook_security_logs` row.

use std::sync::Arc;

use courier_core::signature::{verify_hmac_sha256_hex, WebhookPlatform};
use courier_core::types::DbId;
use courier_db::models::webhook_security::NewWebhookSecurityLog;
use serde::{Deserialize, Serialize};

use crate::store::WebhookStore;

pub const ERR_NO_SIGNATURE: &str = "no signature provided";
pub const ERR_NO_MERCHANT: &str = "no merchant id provided";
pub const ERR_NO_SECRET: &str = "no webhook secret configured";
pub const ERR_SECRET_LOOKUP: &str = "webhook secret lookup failed";
pub const ERR_MISMATCH: &str = "signature mismatch";
pub const NOTE_SKIPPED: &str = "no webhook secret configured; verification skipped";

/// Policy for merchants without a configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Accept unsigned-verifiable requests (marked as skipped).
    Permissive,
    /// Reject them.
    Strict,
}

impl VerificationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(VerificationMode::Permissive),
            "strict" => Some(VerificationMode::Strict),
            _ => None,
        }
    }
}

/// Everything the verifier needs from one inbound request.
#[derive(Debug, Clone)]
pub struct WebhookRequest<'a> {
    pub merchant_id: Option<DbId>,
    pub platform: WebhookPlatform,
    pub payload: &'a [u8],
    /// Raw value of the platform's signature header.
    pub signature: Option<&'a str>,
    pub source_ip: Option<String>,
    pub path: &'a str,
    pub method: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    /// Accepted without a signature check because no secret is configured.
    pub skipped: bool,
    pub error: Option<String>,
}

impl VerificationResult {
    fn valid() -> Self {
        Self {
            valid: true,
            skipped: false,
            error: None,
        }
    }

    fn skipped() -> Self {
        Self {
            valid: true,
            skipped: true,
            error: None,
        }
    }

    fn invalid(error: &str) -> Self {
        Self {
            valid: false,
            skipped: false,
            error: Some(error.to_string()),
        }
    }
}

pub struct WebhookVerifier {
    store: Arc<dyn WebhookStore>,
    mode: VerificationMode,
}

impl WebhookVerifier {
    pub fn new(store: Arc<dyn WebhookStore>, mode: VerificationMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// Verify a request and append its audit row.
    pub async fn verify(&self, request: &WebhookRequest<'_>) -> VerificationResult {
        let result = self.check(request).await;

        let note = if result.skipped {
            Some(NOTE_SKIPPED.to_string())
        } else {
            result.error.clone()
        };
        let entry = NewWebhookSecurityLog {
            merchant_id: request.merchant_id,
            platform: request.platform.as_str().to_string(),
            source_ip: request.source_ip.clone(),
            signature_valid: result.valid,
            request_path: request.path.to_string(),
            request_method: request.method.to_string(),
            error: note,
        };
        if let Err(e) = self.store.append_security_log(&entry).await {
            tracing::error!(
                platform = %request.platform,
                merchant_id = ?request.merchant_id,
                error = %e,
                "Failed to write webhook audit row"
            );
        }

        if !result.valid {
            tracing::warn!(
                platform = %request.platform,
                merchant_id = ?request.merchant_id,
                source_ip = ?request.source_ip,
                error = result.error.as_deref().unwrap_or_default(),
                "Webhook verification failed"
            );
        }
        result
    }

    async fn check(&self, request: &WebhookRequest<'_>) -> VerificationResult {
        let Some(header) = request.signature.filter(|s| !s.trim().is_empty()) else {
            return VerificationResult::invalid(ERR_NO_SIGNATURE);
        };
        let Some(merchant_id) = request.merchant_id else {
            return VerificationResult::invalid(ERR_NO_MERCHANT);
        };

        let secret = match self.store.webhook_secret(merchant_id, request.platform).await {
            Ok(Some(secret)) => secret,
            Ok(None) => {
                return match self.mode {
                    VerificationMode::Permissive => {
                        tracing::info!(
                            merchant_id,
                            platform = %request.platform,
                            "No webhook secret configured, skipping verification"
                        );
                        VerificationResult::skipped()
                    }
                    VerificationMode::Strict => VerificationResult::invalid(ERR_NO_SECRET),
                };
            }
            Err(e) => {
                tracing::error!(merchant_id, error = %e, "Webhook secret lookup failed");
                return VerificationResult::invalid(ERR_SECRET_LOOKUP);
            }
        };

        let digest = request.platform.digest_from_header(header);
        if verify_hmac_sha256_hex(&secret, request.payload, digest) {
            VerificationResult::valid()
        } else {
            VerificationResult::invalid(ERR_MISMATCH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!(VerificationMode::parse("strict"), Some(VerificationMode::Strict));
        assert_eq!(
            VerificationMode::parse(" Permissive "),
            Some(VerificationMode::Permissive)
        );
        assert_eq!(VerificationMode::parse("lenient"), None);
    }
}
