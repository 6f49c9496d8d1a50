//! Typed views over the well-known documents.
//!
//! | Document  | Accessor                          | Override prefix |
//! |-----------|-----------------------------------|-----------------|
//! | `memory`  | [`ConfigStore::memory_settings`]  | `CREW_MEMORY_`  |
//! | `gateway` | [`ConfigStore::gateway_settings`] | `CREW_`         |
//! | `tools`   | [`ConfigStore::tool_settings`]    | `CREW_`         |
//!
//! Sections are deserialized with serde. Accessors never fail: a missing
//! document yields the documented defaults, and a malformed value falls back
//! to its default without discarding the rest of the section. Environment
//! overrides replace values with strings, so scalar settings also accept
//! their string form.

use crate::credentials;
use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;
use cognition_core::{NameRules, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

pub const MEMORY_DOCUMENT: &str = "memory";
pub const GATEWAY_DOCUMENT: &str = "gateway";
pub const TOOLS_DOCUMENT: &str = "tools";

/// Name of the always-present local provider.
pub const DEFAULT_PROVIDER: &str = "default";

/// Gateway cache mode backed by the vector store.
pub const SEMANTIC_CACHE_MODE: &str = "semantic";

const DEFAULT_STORAGE_DIR: &str = "data";
const LONG_TERM_DB_FILE: &str = "long_term_memory_storage.db";
const DEFAULT_EXTERNAL_STORAGE_PATH: &str = "./data/mem0";
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Field readers that tolerate override strings and malformed values.
mod lenient {
    use super::{DeserializeOwned, Deserialize, Deserializer, Value, warn};

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(super::as_string(&Value::deserialize(deserializer)?))
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(super::as_bool(&Value::deserialize(deserializer)?))
    }

    /// Off unless clearly switched on.
    pub fn switch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(flag(deserializer)?.unwrap_or(false))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(super::as_u64(&Value::deserialize(deserializer)?))
    }

    /// A nested section; a value that does not fit becomes the default.
    pub fn section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring malformed configuration section");
            T::default()
        }))
    }
}

/// How a declared provider is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Process-local map.
    Local,
    /// Remote store reached through a retrying connection.
    #[serde(alias = "cloud", alias = "redis")]
    Remote,
    /// External memory service over HTTP.
    #[serde(alias = "mem0")]
    External,
}

impl ProviderKind {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_value(Value::String(raw.to_ascii_lowercase())).ok()
    }
}

/// One entry of the memory document's `providers` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDeclaration {
    pub name: String,
    pub kind: ProviderKind,
    /// Provider-specific settings, `{}` when omitted.
    pub config: Value,
}

/// A `providers` entry as written in the file.
#[derive(Debug, Deserialize)]
struct ProviderEntry {
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::section")]
    config: Map<String, Value>,
}

impl ProviderEntry {
    fn declare(self) -> Option<ProviderDeclaration> {
        let name = match NameRules::PROVIDER_NAME.validate(&self.name) {
            Ok(name) => name,
            Err(e) => {
                warn!(provider = %self.name, error = %e, "invalid provider name, skipping");
                return None;
            }
        };
        let kind = match self.kind.as_deref() {
            None => ProviderKind::External,
            Some(raw) => match ProviderKind::parse(raw) {
                Some(kind) => kind,
                None => {
                    warn!(provider = %name, kind = raw, "unknown provider kind, skipping");
                    return None;
                }
            },
        };
        Some(ProviderDeclaration {
            name,
            kind,
            config: Value::Object(self.config),
        })
    }
}

fn provider_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ProviderDeclaration>, D::Error> {
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        warn!("memory providers must be a list, ignoring");
        return Ok(Vec::new());
    };

    let mut providers: Vec<ProviderDeclaration> = Vec::with_capacity(entries.len());
    for entry in entries {
        let declaration = match serde_json::from_value::<ProviderEntry>(entry) {
            Ok(entry) => entry.declare(),
            Err(e) => {
                warn!(error = %e, "invalid memory provider entry, skipping");
                None
            }
        };
        let Some(declaration) = declaration else {
            continue;
        };
        if providers.iter().any(|p| p.name == declaration.name) {
            warn!(provider = %declaration.name, "duplicate provider declaration, keeping the first");
            continue;
        }
        providers.push(declaration);
    }
    Ok(providers)
}

/// Embedding model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderSettings {
    pub provider: String,
    pub model: String,
    pub dimension: Option<u64>,
}

/// `{provider, config: {model, vector_dimension}}` as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbedderSection {
    #[serde(deserialize_with = "lenient::string")]
    provider: Option<String>,
    #[serde(deserialize_with = "lenient::section")]
    config: EmbedderModelSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbedderModelSection {
    #[serde(deserialize_with = "lenient::string")]
    model: Option<String>,
    #[serde(alias = "dimension", deserialize_with = "lenient::count")]
    vector_dimension: Option<u64>,
}

impl EmbedderSection {
    fn resolve(self, fallback: EmbedderSettings) -> EmbedderSettings {
        EmbedderSettings {
            provider: self.provider.unwrap_or(fallback.provider),
            model: self.config.model.unwrap_or(fallback.model),
            dimension: self.config.vector_dimension.or(fallback.dimension),
        }
    }
}

impl EmbedderSettings {
    /// Local embedder used for crew memory.
    pub fn local_default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: Some(384),
        }
    }

    /// Hosted embedder used by the external memory service.
    pub fn external_default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: None,
        }
    }

    /// Read `{provider, config: {model, vector_dimension}}`, filling gaps
    /// from `fallback`.
    pub fn from_value(value: &Value, fallback: Self) -> Self {
        match serde_json::from_value::<EmbedderSection>(value.clone()) {
            Ok(section) if value.is_object() => section.resolve(fallback),
            _ => fallback,
        }
    }
}

/// The `long_term_memory` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LongTermSettings {
    #[serde(deserialize_with = "lenient::switch")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::switch")]
    pub external: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub connection_string: Option<String>,
}

fn long_term_section<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<LongTermSettings>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        other => {
            warn!(
                found = cognition_core::schema::kind_of(&other),
                "long_term_memory must be a mapping, treating as disabled"
            );
            Ok(None)
        }
    }
}

/// Resolved long-term memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongTermMemory {
    Disabled,
    /// Embedded store under the storage directory.
    Local { path: PathBuf },
    /// External SQL store; the password is read from
    /// `LONG_TERM_DB_PASSWORD` when first needed.
    External { connection_string: String },
}

impl LongTermMemory {
    /// Database password for the external store, `None` otherwise.
    ///
    /// # Errors
    ///
    /// `MissingCredential` if the store is external and the password is unset.
    pub fn database_password(&self) -> ConfigResult<Option<SecretString>> {
        match self {
            LongTermMemory::External { .. } => credentials::long_term_db_password().map(Some),
            _ => Ok(None),
        }
    }
}

/// Settings from the `memory` document.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    pub active_provider: String,
    pub storage_dir: PathBuf,
    pub embedder: EmbedderSettings,
    pub providers: Vec<ProviderDeclaration>,
    /// `None` when the section is absent or explicitly null.
    pub long_term: Option<LongTermSettings>,
}

/// The `memory` document as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemorySection {
    #[serde(deserialize_with = "lenient::string")]
    active_provider: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    storage_dir: Option<String>,
    #[serde(deserialize_with = "lenient::section")]
    embedder: EmbedderSection,
    #[serde(deserialize_with = "provider_list")]
    providers: Vec<ProviderDeclaration>,
    #[serde(deserialize_with = "long_term_section")]
    long_term_memory: Option<LongTermSettings>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            active_provider: DEFAULT_PROVIDER.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            embedder: EmbedderSettings::local_default(),
            providers: Vec::new(),
            long_term: None,
        }
    }
}

impl MemorySettings {
    pub fn from_values(values: &Map<String, Value>) -> Self {
        if values.is_empty() {
            warn!("memory configuration is empty");
            return Self::default();
        }

        let section: MemorySection = serde_json::from_value(Value::Object(values.clone()))
            .unwrap_or_else(|e| {
                warn!(error = %e, "malformed memory configuration, using defaults");
                MemorySection::default()
            });
        let defaults = Self::default();

        Self {
            active_provider: section.active_provider.unwrap_or(defaults.active_provider),
            storage_dir: section
                .storage_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            embedder: section.embedder.resolve(defaults.embedder),
            providers: section.providers,
            long_term: section.long_term_memory,
        }
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderDeclaration> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Decide which long-term memory backend to use.
    ///
    /// # Errors
    ///
    /// `MissingSetting` when the external store is enabled without a
    /// `connection_string`.
    pub fn resolve_long_term(&self) -> ConfigResult<LongTermMemory> {
        let Some(settings) = &self.long_term else {
            debug!("long term memory not configured");
            return Ok(LongTermMemory::Disabled);
        };

        match (settings.enabled, settings.external) {
            (false, _) => Ok(LongTermMemory::Disabled),
            (true, false) => Ok(LongTermMemory::Local {
                path: self.storage_dir.join(LONG_TERM_DB_FILE),
            }),
            (true, true) => settings
                .connection_string
                .clone()
                .filter(|s| !s.trim().is_empty())
                .map(|connection_string| LongTermMemory::External { connection_string })
                .ok_or_else(|| {
                    ConfigError::missing_setting(
                        MEMORY_DOCUMENT,
                        "long_term_memory.connection_string",
                    )
                }),
        }
    }
}

/// Settings for an external memory service provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMemorySettings {
    pub storage_path: PathBuf,
    pub embedder: EmbedderSettings,
    /// Base URL of the memory HTTP API.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// An external provider's `config` as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExternalSection {
    #[serde(deserialize_with = "lenient::string")]
    storage_path: Option<String>,
    #[serde(deserialize_with = "lenient::section")]
    embedder: EmbedderSection,
    #[serde(deserialize_with = "lenient::string")]
    base_url: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    timeout_secs: Option<u64>,
}

impl Default for ExternalMemorySettings {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_EXTERNAL_STORAGE_PATH),
            embedder: EmbedderSettings::external_default(),
            base_url: None,
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl ExternalMemorySettings {
    pub fn from_config(config: &Value) -> Self {
        let section: ExternalSection = serde_json::from_value(config.clone()).unwrap_or_default();
        let defaults = Self::default();
        Self {
            storage_path: section
                .storage_path
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            embedder: section.embedder.resolve(defaults.embedder),
            base_url: section.base_url,
            timeout_secs: section.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Settings from the `gateway` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub cache_mode: String,
    pub environment: String,
    pub project: String,
}

/// `{cache: {mode}, metadata: {environment, project}}` as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GatewaySection {
    #[serde(deserialize_with = "lenient::section")]
    cache: CacheSection,
    #[serde(deserialize_with = "lenient::section")]
    metadata: MetadataSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CacheSection {
    #[serde(deserialize_with = "lenient::string")]
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataSection {
    #[serde(deserialize_with = "lenient::string")]
    environment: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    project: Option<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            cache_mode: SEMANTIC_CACHE_MODE.to_string(),
            environment: "development".to_string(),
            project: "cognition".to_string(),
        }
    }
}

impl GatewaySettings {
    fn from_section(section: GatewaySection) -> Self {
        let defaults = Self::default();
        Self {
            cache_mode: section.cache.mode.unwrap_or(defaults.cache_mode),
            environment: section.metadata.environment.unwrap_or(defaults.environment),
            project: section.metadata.project.unwrap_or(defaults.project),
        }
    }

    /// Password of the vector store behind the semantic cache, `None` for
    /// other cache modes.
    ///
    /// # Errors
    ///
    /// `MissingCredential` when the semantic cache is in use and
    /// `CHROMA_PASSWORD` is unset.
    pub fn vector_cache_password(&self) -> ConfigResult<Option<SecretString>> {
        if self.cache_mode != SEMANTIC_CACHE_MODE {
            return Ok(None);
        }
        credentials::read_credential(credentials::CHROMA_PASSWORD).map(Some)
    }
}

/// Settings from the `tools` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub catalog_url: Option<String>,
    pub cache_enabled: bool,
    pub timeout_secs: u64,
}

/// The `tools` document as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolSection {
    #[serde(deserialize_with = "lenient::string")]
    catalog_url: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    cache_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::count")]
    timeout_secs: Option<u64>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            catalog_url: None,
            cache_enabled: true,
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl ToolSettings {
    fn from_section(section: ToolSection) -> Self {
        let defaults = Self::default();
        Self {
            catalog_url: section.catalog_url,
            cache_enabled: section.cache_enabled.unwrap_or(defaults.cache_enabled),
            timeout_secs: section.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}

impl ConfigStore {
    /// Document `name` with overrides, deserialized into `T`.
    ///
    /// `None` when the document is absent.
    fn section<T: DeserializeOwned + Default>(&self, name: &str) -> Option<T> {
        let values = self.get(name, true).ok()?;
        Some(
            serde_json::from_value(Value::Object(values)).unwrap_or_else(|e| {
                warn!(document = name, error = %e, "malformed configuration, using defaults");
                T::default()
            }),
        )
    }

    /// Settings from the `memory` document with `CREW_MEMORY_` overrides.
    ///
    /// A missing document yields defaults with `active_provider = "default"`.
    pub fn memory_settings(&self) -> MemorySettings {
        match self.get(MEMORY_DOCUMENT, true) {
            Ok(values) => MemorySettings::from_values(&values),
            Err(_) => {
                warn!("memory configuration not found, using defaults");
                MemorySettings::default()
            }
        }
    }

    /// Settings for the external memory provider declared as `provider_name`.
    pub fn external_memory_settings(&self, provider_name: &str) -> ExternalMemorySettings {
        self.memory_settings()
            .provider(provider_name)
            .map(|p| ExternalMemorySettings::from_config(&p.config))
            .unwrap_or_default()
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        let section = self.section(GATEWAY_DOCUMENT).unwrap_or_else(|| {
            debug!("gateway configuration not found, using defaults");
            GatewaySection::default()
        });
        GatewaySettings::from_section(section)
    }

    pub fn tool_settings(&self) -> ToolSettings {
        let section = self.section(TOOLS_DOCUMENT).unwrap_or_else(|| {
            debug!("tools configuration not found, using defaults");
            ToolSection::default()
        });
        ToolSettings::from_section(section)
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_memory_defaults() {
        let settings = MemorySettings::from_values(&Map::new());
        assert_eq!(settings.active_provider, "default");
        assert_eq!(settings.embedder, EmbedderSettings::local_default());
        assert_eq!(settings.resolve_long_term().unwrap(), LongTermMemory::Disabled);
    }

    #[test]
    fn test_provider_declarations() {
        let settings = MemorySettings::from_values(&values(json!({
            "active_provider": "mem0",
            "providers": [
                {"name": "mem0", "config": {"storage_path": "/tmp/mem0"}},
                {"name": "cloud", "kind": "redis", "config": {"retry": {"max_attempts": 5}}},
                {"name": "bad name"},
                {"kind": "local"},
                {"name": "odd", "kind": "quantum"},
                {"name": "mem0", "kind": "local"}
            ]
        })));

        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.providers[0].kind, ProviderKind::External);
        assert_eq!(settings.providers[1].kind, ProviderKind::Remote);
        assert_eq!(
            settings.provider("cloud").unwrap().config,
            json!({"retry": {"max_attempts": 5}})
        );
    }

    #[test]
    fn test_long_term_resolution() {
        let local = MemorySettings::from_values(&values(json!({
            "storage_dir": "/var/lib/cognition",
            "long_term_memory": {"enabled": true}
        })));
        assert_eq!(
            local.resolve_long_term().unwrap(),
            LongTermMemory::Local {
                path: PathBuf::from("/var/lib/cognition/long_term_memory_storage.db")
            }
        );

        let external = MemorySettings::from_values(&values(json!({
            "long_term_memory": {
                "enabled": true,
                "external": true,
                "connection_string": "postgresql://db/memories"
            }
        })));
        assert_eq!(
            external.resolve_long_term().unwrap(),
            LongTermMemory::External {
                connection_string: "postgresql://db/memories".to_string()
            }
        );

        let disabled = MemorySettings::from_values(&values(json!({
            "long_term_memory": {"enabled": false, "external": true}
        })));
        assert_eq!(disabled.resolve_long_term().unwrap(), LongTermMemory::Disabled);

        let nulled = MemorySettings::from_values(&values(json!({"long_term_memory": null})));
        assert_eq!(nulled.long_term, None);
    }

    #[test]
    fn test_external_long_term_without_connection_string_is_loud() {
        let settings = MemorySettings::from_values(&values(json!({
            "long_term_memory": {"enabled": true, "external": true}
        })));
        let err = settings.resolve_long_term().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_SETTING");
        assert!(err.to_string().contains("long_term_memory.connection_string"));
    }

    #[test]
    fn test_embedder_partial_override() {
        let embedder = EmbedderSettings::from_value(
            &json!({"provider": "openai", "config": {"model": "text-embedding-3-large"}}),
            EmbedderSettings::local_default(),
        );
        assert_eq!(embedder.provider, "openai");
        assert_eq!(embedder.model, "text-embedding-3-large");
        assert_eq!(embedder.dimension, Some(384));
    }

    #[test]
    fn test_external_memory_defaults() {
        let settings = ExternalMemorySettings::from_config(&json!({}));
        assert_eq!(settings.storage_path, PathBuf::from("./data/mem0"));
        assert_eq!(settings.embedder.model, "text-embedding-3-small");
        assert_eq!(settings.base_url, None);
    }

    #[test]
    fn test_gateway_sections_tolerate_overridden_scalars() {
        let section: GatewaySection = serde_json::from_value(json!({
            "cache": "off",
            "metadata": {"environment": "production", "project": 7}
        }))
        .unwrap();
        let settings = GatewaySettings::from_section(section);
        assert_eq!(settings.cache_mode, "semantic");
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.project, "7");
    }

    #[test]
    fn test_tool_section_reads_string_scalars() {
        let section: ToolSection = serde_json::from_value(json!({
            "catalog_url": "http://catalog:8080",
            "cache_enabled": "off",
            "timeout_secs": "12"
        }))
        .unwrap();
        let settings = ToolSettings::from_section(section);
        assert_eq!(settings.catalog_url.as_deref(), Some("http://catalog:8080"));
        assert!(!settings.cache_enabled);
        assert_eq!(settings.timeout_secs, 12);
    }

    #[test]
    fn test_malformed_long_term_section_is_disabled() {
        let settings = MemorySettings::from_values(&values(json!({"long_term_memory": "yes"})));
        assert_eq!(settings.long_term, None);
        assert_eq!(settings.resolve_long_term().unwrap(), LongTermMemory::Disabled);
    }

    #[test]
    #[serial_test::serial]
    fn test_vector_cache_password_only_for_semantic_cache() {
        unsafe {
            std::env::remove_var(credentials::CHROMA_PASSWORD);
        }
        let exact = GatewaySettings {
            cache_mode: "exact".to_string(),
            ..GatewaySettings::default()
        };
        assert!(exact.vector_cache_password().unwrap().is_none());

        let semantic = GatewaySettings::default();
        let err = semantic.vector_cache_password().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_CREDENTIAL");

        unsafe {
            std::env::set_var(credentials::CHROMA_PASSWORD, "chroma-secret");
        }
        let password = semantic.vector_cache_password().unwrap().unwrap();
        assert_eq!(password.expose_as_str(), "chroma-secret");
        unsafe {
            std::env::remove_var(credentials::CHROMA_PASSWORD);
        }
    }

    #[test]
    fn test_scalar_coercion_from_override_strings() {
        assert_eq!(as_bool(&json!("false")), Some(false));
        assert_eq!(as_bool(&json!("sometimes")), None);
        assert_eq!(as_u64(&json!("45")), Some(45));
        assert_eq!(as_string(&json!("")), None);
    }
}
