//! Resolved configuration display.

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::GuardConfig;

/// Output format for [`ResolvedConfig::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, as it would appear in a config file.
    #[default]
    Toml,
    /// Pretty-printed JSON.
    Json,
}

/// A loaded configuration plus the files it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The merged and validated configuration.
    pub config: GuardConfig,
    /// Files merged over the embedded defaults, in load order.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Render the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if serialization fails.
    pub fn render(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => toml::to_string_pretty(&self.config)
                .map_err(|e| ConfigError::SerializeError(e.to_string())),
            ShowFormat::Json => serde_json::to_string_pretty(&self.config)
                .map_err(|e| ConfigError::SerializeError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        ResolvedConfig {
            config: GuardConfig::default(),
            loaded_files: Vec::new(),
        }
    }

    #[test]
    fn test_render_toml_round_trips() {
        let text = resolved().render(ShowFormat::Toml).unwrap();
        assert!(text.contains("[bridge]"));
        let parsed: GuardConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, GuardConfig::default());
    }

    #[test]
    fn test_render_json() {
        let text = resolved().render(ShowFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["bridge"]["max_pending"], 256);
        assert!(value["ledger"].get("ttl_secs").is_none());
    }
}
