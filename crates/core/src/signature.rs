//! Inbound webhook HMAC-SHA256 signatures and the per-platform header table.
//!
//! Commerce platforms sign the raw request body with a shared secret and
//! send the hex digest in a platform-specific header. Some platforms prefix
//! the digest (e.g. `sha256=`); the prefix is stripped before comparison.
//! Comparison is constant-time via [`Mac::verify_slice`].

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Platforms
// ---------------------------------------------------------------------------

/// A third-party commerce platform that delivers signed webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookPlatform {
    Salla,
    Zid,
}

impl WebhookPlatform {
    pub const ALL: [WebhookPlatform; 2] = [WebhookPlatform::Salla, WebhookPlatform::Zid];

    pub fn as_str(self) -> &'static str {
        match self {
            WebhookPlatform::Salla => "salla",
            WebhookPlatform::Zid => "zid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }

    /// Lower-case name of the header carrying the signature.
    pub fn signature_header(self) -> &'static str {
        match self {
            WebhookPlatform::Salla => "x-salla-signature",
            WebhookPlatform::Zid => "x-zid-signature",
        }
    }

    /// Prefix the platform puts in front of the hex digest, if any.
    pub fn signature_prefix(self) -> Option<&'static str> {
        match self {
            WebhookPlatform::Salla => None,
            WebhookPlatform::Zid => Some("sha256="),
        }
    }

    /// Strip this platform's framing from a raw header value.
    pub fn digest_from_header(self, header_value: &str) -> &str {
        let value = header_value.trim();
        match self.signature_prefix() {
            Some(prefix) => value.strip_prefix(prefix).unwrap_or(value),
            None => value,
        }
    }

    /// Produce the header value this platform would send for `payload`.
    pub fn sign(self, secret: &str, payload: &[u8]) -> String {
        let digest = compute_hmac_sha256_hex(secret, payload);
        match self.signature_prefix() {
            Some(prefix) => format!("{prefix}{digest}"),
            None => digest,
        }
    }
}

impl std::fmt::Display for WebhookPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HMAC
// ---------------------------------------------------------------------------

fn new_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Compute the hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn compute_hmac_sha256_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex digest against the HMAC-SHA256 of `payload`.
///
/// Malformed hex yields `false`. The byte comparison is constant-time.
pub fn verify_hmac_sha256_hex(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Some(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = new_mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

// ---------------------------------------------------------------------------
// hex encoding helper (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string (either case). Returns `None` on odd length or
    /// non-hex characters.
    pub fn decode(value: &str) -> Option<Vec<u8>> {
        if value.len() % 2 != 0 {
            return None;
        }
        value
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16)?;
                let lo = (pair[1] as char).to_digit(16)?;
                Some((hi * 16 + lo) as u8)
            })
            .collect()
    }
}
