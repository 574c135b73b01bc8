//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml` → base
//! 2. Merge the user file (`~/.allowguard/config.toml`, else
//!    `$ALLOWGUARD_HOME/config.toml`)
//! 3. Merge the explicit file, if one was given
//! 4. Apply `ALLOWGUARD_LOG_*` environment overrides
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{HOME_VAR, apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::show::ResolvedConfig;
use crate::types::GuardConfig;
use crate::validate;

/// Embedded default configuration.
pub(crate) const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Load the configuration with layered file precedence.
///
/// `explicit` is a file named on the command line; it must exist.
/// `home_override` replaces the user config directory (the file read is
/// `<home_override>/config.toml`).
///
/// # Errors
///
/// Returns a [`ConfigError`] if any file is unreadable or malformed, or if
/// the merged configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, home_override, &collect_env_vars())
}

pub(crate) fn load_with_env(
    explicit: Option<&Path>,
    home_override: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut loaded_files = Vec::new();

    for path in user_config_candidates(home_override, env) {
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %path.display(), "loaded user config");
            loaded_files.push(path.display().to_string());
            break;
        }
    }

    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path.display().to_string());
    }

    let overridden = apply_env_overrides(&mut merged, env);
    if overridden > 0 {
        debug!(count = overridden, "applied environment overrides");
    }

    let config: GuardConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// Fields the file omits take their built-in defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<GuardConfig> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: GuardConfig = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// User config files to try, in order. The first that exists wins.
fn user_config_candidates(
    home_override: Option<&Path>,
    env: &HashMap<String, String>,
) -> Vec<PathBuf> {
    if let Some(dir) = home_override {
        return vec![dir.join("config.toml")];
    }
    let mut candidates = Vec::new();
    match directories::BaseDirs::new() {
        Some(dirs) => candidates.push(dirs.home_dir().join(".allowguard").join("config.toml")),
        None => debug!("no home directory; skipping ~/.allowguard"),
    }
    if let Some(home) = env.get(HOME_VAR).filter(|h| !h.trim().is_empty()) {
        candidates.push(PathBuf::from(home).join("config.toml"));
    }
    candidates
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeoutFallback;
    use std::time::Duration;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_match_struct_defaults() {
        let config: GuardConfig = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, GuardConfig::default());
    }

    #[test]
    fn test_load_with_only_defaults() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(resolved.config.bridge.max_pending, 256);
        assert_eq!(resolved.config.interceptor.decision_timeout(), None);
    }

    #[test]
    fn test_layers_and_env_precedence() {
        let home = tempfile::tempdir().unwrap();
        write(
            home.path(),
            "config.toml",
            "[bridge]\nmax_pending = 8\n[logging]\nlevel = \"warn\"\n",
        );
        let explicit = write(
            home.path(),
            "explicit.toml",
            "[interceptor]\ndecision_timeout_ms = 1500\ntimeout_fallback = \"block\"\n[ledger]\nttl_secs = 30\n",
        );
        let env = HashMap::from([("ALLOWGUARD_LOG_LEVEL".to_owned(), "debug".to_owned())]);

        let resolved = load_with_env(Some(&explicit), Some(home.path()), &env).unwrap();
        let config = resolved.config;
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(config.bridge.max_pending, 8);
        assert_eq!(config.bridge.confirmation_phrase, "I UNDERSTAND THE RISK");
        assert_eq!(config.interceptor.decision_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.interceptor.timeout_fallback, TimeoutFallback::Block);
        assert_eq!(config.ledger.ttl(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let missing = home.path().join("nope.toml");
        let result = load_with_env(Some(&missing), Some(home.path()), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_overlay_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), "config.toml", "[bridge]\nmax_pending = 0\n");
        let result = load_with_env(None, Some(home.path()), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_malformed_toml() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), "config.toml", "[bridge\n");
        let result = load_with_env(None, Some(home.path()), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "c.toml", "[ledger]\nttl_secs = 5\n");
        let config = load_file(&path).unwrap();
        assert_eq!(config.ledger.ttl_secs, Some(5));
        assert_eq!(config.blacklist.addresses.len(), 3);
    }
}
