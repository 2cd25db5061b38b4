//! Layered configuration for Cairn: built-in defaults, overlaid by an optional TOML file, overlaid
//! by environment variables.
//!
//! Precedence, lowest to highest: [`CairnConfig::default`], TOML file, environment (`CAIRN_*`, see
//! [`cairn_env`]).

pub mod cairn_env;
pub mod env;
pub mod providers;
pub mod search;
pub mod storage;

use providers::ProvidersConfig;
use search::SearchConfig;
use std::path::Path;
use storage::StorageConfig;
use thiserror::Error;

pub use env::{EnvCategory, EnvRegistry, EnvVarDef, EnvVarDefBuilder, IsolationMode};
pub use providers::{EmbedderBackendConfig, LlmBackendConfig, RerankerBackendConfig, TimeoutsConfig};
pub use search::SearchConfig as SearchTunables;
pub use storage::{GraphStorageConfig, RelationalStorageConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to apply environment overlay: {0}")]
    Env(String),
    #[error("failed to apply overlay to config: {0}")]
    Overlay(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration object. Every field has a spec-matching default, so `CairnConfig::default`
/// alone is a valid, runnable configuration.
#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CairnConfig {
    pub search: SearchConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
}

impl CairnConfig {
    /// Load configuration: defaults, overlaid by `path` (if it exists),
    /// overlaid by the registered `CAIRN_*` environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file exists but is unreadable or
    /// malformed, if an environment override fails validation, or if the
    /// resulting configuration violates an internal invariant (weights not
    /// summing to 1.0, thresholds out of range).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut value = serde_json::to_value(Self::default())?;

        if let Some(path) = path {
            if path.exists() {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
                let file_value: toml::Value = toml::from_str(&text)?;
                let file_json = serde_json::to_value(file_value)?;
                merge_json(&mut value, file_json);
            }
        }

        let registry = EnvRegistry::new();
        cairn_env::register_cairn_vars(&registry).map_err(ConfigError::Env)?;
        registry.load_from_env().map_err(ConfigError::Env)?;
        let overlay = registry.build_overlay().map_err(ConfigError::Env)?;
        merge_json(&mut value, overlay);

        let config: Self = serde_json::from_value(value)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validate cross-field invariants not expressible in the type system alone.
    ///
    /// # Errors Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        self.search.validate()
    }
}

/// Recursive merge: every key present in `overlay` overrides `base`,
/// objects merge field-by-field, everything else replaces wholesale.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                merge_json(base_map.entry(key).or_insert(serde_json::Value::Null), overlay_value);
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        assert!(CairnConfig::default().validate().is_ok());
    }

    #[test]
    fn load_with_no_file_and_no_env_returns_defaults() {
        let config = CairnConfig::load(None).expect("defaults alone must load");
        assert_eq!(config, CairnConfig::default());
    }

    #[test]
    fn load_applies_toml_file_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cairn.toml");
        std::fs::write(&path, "[search]\nrrf_k = 80.0\n").unwrap();
        let config = CairnConfig::load(Some(&path)).expect("file overlay must load");
        assert_eq!(config.search.rrf_k, 80.0);
        assert_eq!(config.search.weight_vector, SearchConfig::default().weight_vector);
    }

    #[test]
    fn merge_json_overrides_only_named_keys() {
        let mut base = serde_json::json!({"a": 1, "b": {"c": 2, "d": 3}});
        let overlay = serde_json::json!({"b": {"c": 99}});
        merge_json(&mut base, overlay);
        assert_eq!(base["a"], 1);
        assert_eq!(base["b"]["c"], 99);
        assert_eq!(base["b"]["d"], 3);
    }

    #[test]
    fn env_overlay_rejects_invalid_weight_sum() {
        let registry = EnvRegistry::isolated();
        cairn_env::register_cairn_vars(&registry).unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("CAIRN_SEARCH_WEIGHT_VECTOR".to_string(), "0.99".to_string());
        registry.with_overrides(overrides).unwrap();
        let overlay = registry.build_overlay().unwrap();
        let mut value = serde_json::to_value(CairnConfig::default()).unwrap();
        merge_json(&mut value, overlay);
        let config: CairnConfig = serde_json::from_value(value).unwrap();
        assert!(config.validate().is_err());
    }
}
