//! Engine configuration loaded from environment variables.

use std::time::Duration;

use courier_core::clock::ReferenceZone;

use crate::webhook_verify::VerificationMode;

/// Engine-wide settings.
///
/// | Variable                        | Default      |
/// |---------------------------------|--------------|
/// | `REFERENCE_UTC_OFFSET_MINUTES`  | `0`          |
/// | `GLOBAL_SETTINGS_TTL_SECS`      | `60`         |
/// | `WEBHOOK_VERIFICATION_MODE`     | `permissive` |
/// | `REPORT_CHECK_INTERVAL_SECS`    | `3600`       |
/// | `REPORT_ITEM_TIMEOUT_SECS`      | `120`        |
/// | `REPORT_CLAIM_ENABLED`          | `false`      |
///
/// An unrecognised `WEBHOOK_VERIFICATION_MODE` selects `strict`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Zone in which quiet hours and report schedules are interpreted.
    pub reference_zone: ReferenceZone,
    /// How long the global settings record is cached. Zero disables caching.
    pub global_settings_ttl: Duration,
    pub verification_mode: VerificationMode,
    pub report_check_interval: Duration,
    /// Upper bound on processing a single report.
    pub report_item_timeout: Duration,
    /// Claim each due report before processing (multi-instance deployments).
    pub report_claim_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_zone: ReferenceZone::utc(),
            global_settings_ttl: Duration::from_secs(60),
            verification_mode: VerificationMode::Permissive,
            report_check_interval: Duration::from_secs(3600),
            report_item_timeout: Duration::from_secs(120),
            report_claim_enabled: false,
        }
    }
}

impl EngineConfig {
    /// Load from the environment. Unset or unparseable values keep their
    /// defaults; an out-of-range UTC offset is logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let reference_zone = match env_parse::<i32>("REFERENCE_UTC_OFFSET_MINUTES") {
            Some(minutes) => ReferenceZone::from_offset_minutes(minutes).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring REFERENCE_UTC_OFFSET_MINUTES");
                defaults.reference_zone
            }),
            None => defaults.reference_zone,
        };

        let verification_mode = verification_mode_from(
            std::env::var("WEBHOOK_VERIFICATION_MODE").ok().as_deref(),
            defaults.verification_mode,
        );

        Self {
            reference_zone,
            global_settings_ttl: env_parse("GLOBAL_SETTINGS_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.global_settings_ttl),
            verification_mode,
            report_check_interval: env_parse("REPORT_CHECK_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.report_check_interval),
            report_item_timeout: env_parse("REPORT_ITEM_TIMEOUT_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.report_item_timeout),
            report_claim_enabled: env_parse("REPORT_CLAIM_ENABLED")
                .unwrap_or(defaults.report_claim_enabled),
        }
    }
}

/// An unset or blank value keeps `default`. A value that is set but not
/// recognised selects [`VerificationMode::Strict`]: a typo must never turn
/// signature checks off.
fn verification_mode_from(raw: Option<&str>, default: VerificationMode) -> VerificationMode {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => default,
        Some(value) => VerificationMode::parse(value).unwrap_or_else(|| {
            tracing::warn!(
                value = %value,
                "Unrecognised WEBHOOK_VERIFICATION_MODE, falling back to strict"
            );
            VerificationMode::Strict
        }),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
