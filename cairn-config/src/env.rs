//! Centralized environment variable registry for Cairn configuration.
//!
//! Every tunable that can be overridden from the environment is registered
//! here once, with a description, a default, and a validator, rather than
//! scattered `std::env::var` calls through the codebase.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Category of environment variable, used for `list_vars` grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvCategory {
    /// RRF weights, rerank pool size, token budget, router/merge thresholds.
    Search,
    /// Embedder/LLM/reranker backend selection and connection settings.
    Provider,
    /// Relational/vector/graph storage connection settings.
    Storage,
}

/// Isolation mode for environment variable handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IsolationMode {
    /// Read the process environment (default, production mode).
    #[default]
    Global,
    /// Ignore the process environment; overrides only (used by tests).
    Isolated,
}

type ValidatorFn = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Definition of a single environment variable.
pub struct EnvVarDef {
    pub name: String,
    pub description: String,
    pub category: EnvCategory,
    pub default: Option<String>,
    pub validator: ValidatorFn,
    /// Dotted path into the config JSON this variable overrides, e.g.
    /// `"search.rrf_k"`.
    pub config_path: Option<String>,
}

/// (Name, Description, Category, ConfigPath) for `list_vars`.
pub type EnvVarInfo = (String, String, EnvCategory, Option<String>);

/// Registry of known environment variables, their defaults, and their
/// validators. Built once at startup via [`crate::register_cairn_vars`].
pub struct EnvRegistry {
    definitions: Arc<RwLock<HashMap<String, EnvVarDef>>>,
    overrides: Arc<RwLock<HashMap<String, String>>>,
    isolation_mode: IsolationMode,
    cached_values: Arc<RwLock<HashMap<String, String>>>,
}

impl EnvRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_isolation(IsolationMode::Global)
    }

    #[must_use]
    pub fn isolated() -> Self {
        Self::with_isolation(IsolationMode::Isolated)
    }

    #[must_use]
    pub fn with_isolation(mode: IsolationMode) -> Self {
        Self {
            definitions: Arc::new(RwLock::new(HashMap::new())),
            overrides: Arc::new(RwLock::new(HashMap::new())),
            isolation_mode: mode,
            cached_values: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_var(&self, def: EnvVarDef) -> Result<(), String> {
        let mut defs = self.definitions.write().map_err(|e| e.to_string())?;
        if defs.contains_key(&def.name) {
            return Err(format!("environment variable {} already registered", def.name));
        }
        defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Snapshot the process environment into the cache, validating every
    /// value found against its registered validator.
    pub fn load_from_env(&self) -> Result<(), String> {
        if self.isolation_mode == IsolationMode::Isolated {
            return Ok(());
        }
        let defs = self.definitions.read().map_err(|e| e.to_string())?;
        let mut cached = self.cached_values.write().map_err(|e| e.to_string())?;
        for (name, def) in defs.iter() {
            if let Ok(value) = std::env::var(name) {
                (def.validator)(&value)?;
                cached.insert(name.clone(), value);
            }
        }
        Ok(())
    }

    /// Build a JSON overlay from every variable that was actually set
    /// (override or environment) — never from defaults, since defaults are
    /// already baked into the config struct's `Default` impl.
    pub fn build_overlay(&self) -> Result<Value, String> {
        let cached = self.cached_values.read().map_err(|e| e.to_string())?;
        let overrides = self.overrides.read().map_err(|e| e.to_string())?;
        let defs = self.definitions.read().map_err(|e| e.to_string())?;

        let mut overlay = serde_json::json!({});
        for (name, value) in cached.iter().chain(overrides.iter()) {
            if let Some(def) = defs.get(name) {
                (def.validator)(value)?;
                if let Some(path) = &def.config_path {
                    apply_to_json_path(&mut overlay, path, value)?;
                }
            }
        }
        Ok(overlay)
    }

    pub fn with_overrides(&self, overrides: HashMap<String, String>) -> Result<(), String> {
        let mut current = self.overrides.write().map_err(|e| e.to_string())?;
        current.extend(overrides);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let overrides = self.overrides.read().ok()?;
        let cached = self.cached_values.read().ok()?;
        let defs = self.definitions.read().ok()?;
        overrides.get(name).or_else(|| cached.get(name)).or_else(|| defs.get(name).and_then(|d| d.default.as_ref())).cloned()
    }

    pub fn list_vars(&self) -> Result<Vec<EnvVarInfo>, String> {
        let defs = self.definitions.read().map_err(|e| e.to_string())?;
        let mut vars: Vec<_> =
            defs.values().map(|def| (def.name.clone(), def.description.clone(), def.category.clone(), def.config_path.clone())).collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vars)
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_to_json_path(config: &mut Value, path: &str, value: &str) -> Result<(), String> {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = config;
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            let obj = current.as_object_mut().ok_or_else(|| format!("cannot set {part} on non-object"))?;
            let parsed = if let Ok(b) = value.parse::<bool>() {
                Value::Bool(b)
            } else if let Ok(n) = value.parse::<i64>() {
                Value::Number(serde_json::Number::from(n))
            } else if let Ok(f) = value.parse::<f64>() {
                serde_json::Number::from_f64(f).map(Value::Number).unwrap_or_else(|| Value::String(value.to_string()))
            } else {
                Value::String(value.to_string())
            };
            obj.insert((*part).to_string(), parsed);
        } else {
            if !current.as_object().is_some_and(|o| o.contains_key(*part)) {
                if let Some(obj) = current.as_object_mut() {
                    obj.insert((*part).to_string(), Value::Object(serde_json::Map::new()));
                }
            }
            current = current.get_mut(*part).ok_or_else(|| format!("failed to navigate to {part}"))?;
        }
    }
    Ok(())
}

/// Builder for [`EnvVarDef`].
pub struct EnvVarDefBuilder {
    name: String,
    description: String,
    category: EnvCategory,
    default: Option<String>,
    validator: Option<ValidatorFn>,
    config_path: Option<String>,
}

impl EnvVarDefBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: String::new(), category: EnvCategory::Search, default: None, validator: None, config_path: None }
    }

    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    #[must_use]
    pub fn category(mut self, cat: EnvCategory) -> Self {
        self.category = cat;
        self
    }

    #[must_use]
    pub fn default(mut self, val: impl Into<String>) -> Self {
        self.default = Some(val.into());
        self
    }

    #[must_use]
    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn build(self) -> EnvVarDef {
        EnvVarDef {
            name: self.name,
            description: self.description,
            category: self.category,
            default: self.default,
            validator: self.validator.unwrap_or_else(|| Box::new(|_| Ok(()))),
            config_path: self.config_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_read_default() {
        let registry = EnvRegistry::isolated();
        registry.register_var(EnvVarDefBuilder::new("CAIRN_TEST").default("fallback").build()).unwrap();
        assert_eq!(registry.get("CAIRN_TEST"), Some("fallback".to_string()));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let registry = EnvRegistry::isolated();
        registry.register_var(EnvVarDefBuilder::new("CAIRN_TEST").default("fallback").build()).unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("CAIRN_TEST".to_string(), "explicit".to_string());
        registry.with_overrides(overrides).unwrap();
        assert_eq!(registry.get("CAIRN_TEST"), Some("explicit".to_string()));
    }

    #[test]
    fn validator_rejects_bad_override() {
        let registry = EnvRegistry::isolated();
        registry
            .register_var(
                EnvVarDefBuilder::new("CAIRN_RATIO")
                    .validator(|v| v.parse::<f64>().map(|_| ()).map_err(|e| e.to_string()))
                    .config_path("search.rrf_k")
                    .build(),
            )
            .unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("CAIRN_RATIO".to_string(), "not-a-number".to_string());
        registry.with_overrides(overrides).unwrap();
        assert!(registry.build_overlay().is_err());
    }
}
