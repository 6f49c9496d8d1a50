//! Environment variable overrides and helpers.
//!
//! ## Environment Variables
//!
//! - `CONFIG_DIR` - Configuration directory (default: `config`)
//! - `COGNITION_CONFIG_DEBOUNCE_MS` - File event debounce window (default: 200)
//! - `COGNITION_CONFIG_WATCH` - Watch the directory for changes (default: true)
//! - `CREW_<KEY>` - Overrides top-level key `<key>` of any document
//! - `CREW_MEMORY_<KEY>` - Overrides top-level key `<key>` of the `memory` document
//!
//! Overrides are computed at read time and never written back into the store.

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Prefix applied when a document has no dedicated rule.
pub const DEFAULT_OVERRIDE_PREFIX: &str = "CREW_";

/// Prefix for the `memory` document.
pub const MEMORY_OVERRIDE_PREFIX: &str = "CREW_MEMORY_";

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_VAR: &str = "CONFIG_DIR";

/// Directory used when `CONFIG_DIR` is unset.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Maps a document's top-level keys to environment variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverrideRule {
    prefix: String,
}

impl EnvOverrideRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Variable consulted for `key`: the prefix followed by the upper-cased key.
    pub fn variable_for(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase())
    }

    /// Return a copy of `values` with present variables substituted.
    ///
    /// Only keys already in the document are considered, and the replacement
    /// is always the raw string value of the variable.
    pub fn apply(&self, values: &Map<String, Value>) -> Map<String, Value> {
        values
            .iter()
            .map(|(key, value)| {
                let replaced = env::var(self.variable_for(key))
                    .map(Value::String)
                    .unwrap_or_else(|_| value.clone());
                (key.clone(), replaced)
            })
            .collect()
    }
}

impl Default for EnvOverrideRule {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_PREFIX)
    }
}

/// Per-document override rules with a fallback.
#[derive(Debug, Clone)]
pub struct OverrideRules {
    fallback: EnvOverrideRule,
    per_document: HashMap<String, EnvOverrideRule>,
}

impl OverrideRules {
    pub fn new(fallback: EnvOverrideRule) -> Self {
        Self {
            fallback,
            per_document: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, document: impl Into<String>, rule: EnvOverrideRule) -> Self {
        self.per_document.insert(document.into(), rule);
        self
    }

    pub fn rule_for(&self, document: &str) -> &EnvOverrideRule {
        self.per_document.get(document).unwrap_or(&self.fallback)
    }
}

impl Default for OverrideRules {
    fn default() -> Self {
        Self::new(EnvOverrideRule::default())
            .with_rule("memory", EnvOverrideRule::new(MEMORY_OVERRIDE_PREFIX))
    }
}

/// Configuration directory from `CONFIG_DIR`, or the default.
pub fn config_dir_from_env() -> PathBuf {
    get_env_string(CONFIG_DIR_VAR)
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

pub fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub fn get_env_bool(key: &str) -> ConfigResult<Option<bool>> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

pub fn get_env_u64(key: &str) -> ConfigResult<Option<u64>> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u64 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
