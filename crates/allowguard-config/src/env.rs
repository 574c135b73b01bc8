//! Environment variable overrides.

use std::collections::HashMap;

/// Overrides the user home directory for config discovery.
pub const HOME_VAR: &str = "ALLOWGUARD_HOME";

/// Environment variables mapped onto config fields.
const OVERRIDES: [(&str, &str, &str); 2] = [
    ("ALLOWGUARD_LOG_LEVEL", "logging", "level"),
    ("ALLOWGUARD_LOG_FORMAT", "logging", "format"),
];

/// Snapshot the `ALLOWGUARD_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("ALLOWGUARD_"))
        .collect()
}

/// Apply environment overrides to a merged config tree.
///
/// Returns the number of fields overridden.
pub fn apply_env_overrides(merged: &mut toml::Value, env: &HashMap<String, String>) -> usize {
    let Some(root) = merged.as_table_mut() else {
        return 0;
    };
    let mut applied: usize = 0;
    for (var, section, key) in OVERRIDES {
        let Some(value) = env.get(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let table = root
            .entry(section)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = table.as_table_mut() {
            table.insert(key.to_owned(), toml::Value::String(value.trim().to_owned()));
            applied = applied.saturating_add(1);
        }
    }
    applied
}
