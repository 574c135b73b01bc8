//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::GuardConfig;

/// Maximum number of installation attempts.
const MAX_RETRY_ATTEMPTS: usize = 16;
/// Maximum delay between installation attempts (one minute).
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &GuardConfig) -> ConfigResult<()> {
    validate_addresses("blacklist.addresses", &config.blacklist.addresses)?;
    validate_addresses("contracts.marketplaces", &config.contracts.marketplaces)?;
    validate_addresses("contracts.permits", &config.contracts.permits)?;
    validate_interceptor(config)?;
    validate_bridge(config)?;
    validate_ledger(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Whether `s` is `0x` followed by exactly 40 hex digits.
#[must_use]
pub fn is_hex_address(s: &str) -> bool {
    let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn validate_addresses(field: &str, addresses: &[String]) -> ConfigResult<()> {
    if let Some(bad) = addresses.iter().find(|a| !is_hex_address(a)) {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!("'{bad}' is not a 20-byte hex address"),
        });
    }
    Ok(())
}

fn validate_interceptor(config: &GuardConfig) -> ConfigResult<()> {
    let i = &config.interceptor;

    if i.retry_delays_ms.len() > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::ValidationError {
            field: "interceptor.retry_delays_ms".to_owned(),
            message: format!("at most {MAX_RETRY_ATTEMPTS} installation attempts are allowed"),
        });
    }

    if let Some(delay) = i.retry_delays_ms.iter().find(|d| **d > MAX_RETRY_DELAY_MS) {
        return Err(ConfigError::ValidationError {
            field: "interceptor.retry_delays_ms".to_owned(),
            message: format!("delay {delay}ms exceeds the {MAX_RETRY_DELAY_MS}ms limit"),
        });
    }

    if i.decision_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "interceptor.decision_timeout_ms".to_owned(),
            message: "decision_timeout_ms must be positive; remove it to wait indefinitely"
                .to_owned(),
        });
    }

    Ok(())
}

fn validate_bridge(config: &GuardConfig) -> ConfigResult<()> {
    if config.bridge.max_pending == 0 {
        return Err(ConfigError::ValidationError {
            field: "bridge.max_pending".to_owned(),
            message: "max_pending must be at least 1".to_owned(),
        });
    }

    if config.bridge.confirmation_phrase.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "bridge.confirmation_phrase".to_owned(),
            message: "confirmation_phrase must not be empty".to_owned(),
        });
    }

    Ok(())
}

fn validate_ledger(config: &GuardConfig) -> ConfigResult<()> {
    if config.ledger.ttl_secs == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "ledger.ttl_secs".to_owned(),
            message: "ttl_secs must be positive; remove it to disable expiry".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &GuardConfig) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
