//! The configuration store.
//!
//! [`ConfigStore`] keeps one immutable [`ConfigDocument`] per YAML file of a
//! directory. The document map lives in an [`ArcSwap`]; every load or reload
//! builds a new map and swaps it in, so concurrent readers see either the old
//! or the new document and never a partially parsed one.

use crate::document::{ConfigDocument, document_name};
use crate::env::{self, OverrideRules};
use crate::error::{ConfigError, ConfigResult};
use crate::watch::{self, ReloadEvent, WatchHandle};
use arc_swap::ArcSwap;
use cognition_core::{Schema, path};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Debounce window applied to file system events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

const EVENT_CHANNEL_CAPACITY: usize = 64;

type DocumentMap = HashMap<String, Arc<ConfigDocument>>;

/// A file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names of documents loaded, in file name order.
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builder for [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigStoreBuilder {
    directory: PathBuf,
    rules: OverrideRules,
    debounce: Duration,
}

impl Default for ConfigStoreBuilder {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(env::DEFAULT_CONFIG_DIR),
            rules: OverrideRules::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl ConfigStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from the environment.
    ///
    /// Reads `CONFIG_DIR` and `COGNITION_CONFIG_DEBOUNCE_MS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the debounce value is not an integer.
    pub fn from_env() -> ConfigResult<Self> {
        let mut builder = Self::default().directory(env::config_dir_from_env());
        if let Some(ms) = env::get_env_u64("COGNITION_CONFIG_DEBOUNCE_MS")? {
            builder = builder.debounce(Duration::from_millis(ms));
        }
        Ok(builder)
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn override_rules(mut self, rules: OverrideRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Scan the directory and build the store.
    ///
    /// # Errors
    ///
    /// Only a missing directory is fatal. Individual files that fail to parse
    /// are recorded in [`ConfigStore::load_report`].
    pub fn load(self) -> ConfigResult<ConfigStore> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = ConfigStore {
            inner: Arc::new(StoreInner {
                directory: self.directory,
                documents: ArcSwap::from_pointee(HashMap::new()),
                report: ArcSwap::from_pointee(LoadReport::default()),
                rules: self.rules,
                events,
                debounce: self.debounce,
                reload_lock: Mutex::new(()),
            }),
        };
        store.reload_all()?;
        Ok(store)
    }
}

struct StoreInner {
    directory: PathBuf,
    documents: ArcSwap<DocumentMap>,
    report: ArcSwap<LoadReport>,
    rules: OverrideRules,
    events: broadcast::Sender<ReloadEvent>,
    debounce: Duration,
    /// Held while a reload swaps the document map, so a full rescan and a
    /// single-file reload never overwrite each other.
    reload_lock: Mutex<()>,
}

/// Hot-reloadable set of configuration documents.
///
/// Cloning is cheap and every clone observes the same documents.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("directory", &self.inner.directory)
            .field("documents", &self.names())
            .finish()
    }
}

impl ConfigStore {
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::new()
    }

    /// Load every document in `directory` with default override rules.
    pub fn load(directory: impl Into<PathBuf>) -> ConfigResult<Self> {
        ConfigStoreBuilder::new().directory(directory).load()
    }

    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Report of the most recent full directory scan.
    pub fn load_report(&self) -> Arc<LoadReport> {
        self.inner.report.load_full()
    }

    /// Rescan the whole directory.
    ///
    /// Documents whose file fails to parse keep their previous version;
    /// documents whose file disappeared are dropped.
    pub fn reload_all(&self) -> ConfigResult<LoadReport> {
        let directory = &self.inner.directory;
        if !directory.is_dir() {
            return Err(ConfigError::DirectoryMissing {
                path: directory.clone(),
            });
        }

        let _guard = self
            .inner
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
            .map_err(|e| ConfigError::parse(directory, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && document_name(p).is_some())
            .collect();
        paths.sort();

        let previous = self.inner.documents.load_full();
        let mut next = DocumentMap::new();
        let mut report = LoadReport::default();

        for path in paths {
            let parsed = ConfigDocument::from_path(&path).and_then(|doc| {
                if next.contains_key(doc.name()) {
                    Err(ConfigError::parse(
                        &path,
                        format!("duplicate document name '{}'", doc.name()),
                    ))
                } else {
                    Ok(doc)
                }
            });

            match parsed {
                Ok(doc) => {
                    debug!(document = doc.name(), path = %path.display(), "loaded configuration document");
                    report.loaded.push(doc.name().to_string());
                    next.insert(doc.name().to_string(), Arc::new(doc));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping configuration file");
                    if let Some(name) = document_name(&path)
                        && let Some(old) = previous.get(&name)
                        && !next.contains_key(&name)
                    {
                        next.insert(name, Arc::clone(old));
                    }
                    report.failures.push(LoadFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            directory = %directory.display(),
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "configuration loaded"
        );

        self.inner.documents.store(Arc::new(next));
        self.inner.report.store(Arc::new(report.clone()));
        Ok(report)
    }

    /// Re-read one file and swap its document in.
    ///
    /// On failure the previous document stays active, subscribers receive
    /// [`ReloadEvent::Failed`], and the error is returned.
    pub fn reload_path(&self, path: &Path) -> ConfigResult<Arc<ConfigDocument>> {
        let name = document_name(path).unwrap_or_else(|| path.display().to_string());

        match ConfigDocument::from_path(path) {
            Ok(doc) => {
                let doc = Arc::new(doc);
                {
                    let _guard = self
                        .inner
                        .reload_lock
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    self.inner.documents.rcu(|current| {
                        let mut next = DocumentMap::clone(current);
                        next.insert(name.clone(), Arc::clone(&doc));
                        next
                    });
                }
                info!(document = %name, "configuration reloaded");
                self.publish(ReloadEvent::Reloaded { name });
                Ok(doc)
            }
            Err(e) => {
                error!(document = %name, error = %e, "configuration reload failed, keeping previous version");
                self.publish(ReloadEvent::Failed {
                    name,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Names of all loaded documents, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.documents.load().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.documents.load().contains_key(name)
    }

    /// The stored document, without overrides.
    pub fn document(&self, name: &str) -> ConfigResult<Arc<ConfigDocument>> {
        self.inner
            .documents
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::not_found(name))
    }

    /// Values of document `name`.
    ///
    /// With `apply_overrides`, top-level keys are replaced by matching
    /// environment variables; the stored document is left untouched.
    pub fn get(&self, name: &str, apply_overrides: bool) -> ConfigResult<Map<String, Value>> {
        let doc = self.document(name)?;
        if apply_overrides {
            Ok(self.inner.rules.rule_for(name).apply(doc.values()))
        } else {
            Ok(doc.values().clone())
        }
    }

    /// Value at `dotted_path` in the overridden view of document `name`.
    ///
    /// Never fails: an unknown document, missing key, or non-mapping
    /// intermediate yields `default`.
    pub fn get_nested(&self, name: &str, dotted_path: &str, default: Value) -> Value {
        match self.get(name, true) {
            Ok(values) => path::lookup(&Value::Object(values), dotted_path)
                .cloned()
                .unwrap_or(default),
            Err(_) => default,
        }
    }

    /// Typed variant of [`get_nested`](Self::get_nested); a value that does
    /// not deserialize into `T` also yields `default`.
    pub fn get_nested_as<T: DeserializeOwned>(&self, name: &str, dotted_path: &str, default: T) -> T {
        match self.get_nested(name, dotted_path, Value::Null) {
            Value::Null => default,
            value => serde_json::from_value(value).unwrap_or(default),
        }
    }

    /// Check document `name` against `schema`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown document, otherwise `Validation` carrying
    /// every violation.
    pub fn validate(&self, name: &str, schema: &Schema) -> ConfigResult<()> {
        let values = self.get(name, true)?;
        schema
            .validate_object(&values)
            .map_err(|violations| ConfigError::Validation {
                name: name.to_string(),
                violations,
            })
    }

    /// Receive reload notifications from the watcher.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.inner.events.subscribe()
    }

    /// Start watching the directory for changes.
    ///
    /// Must be called from within a tokio runtime. The watcher stops when the
    /// returned handle is dropped or stopped.
    pub fn start_watching(&self) -> ConfigResult<WatchHandle> {
        watch::spawn(self.clone())
    }

    fn publish(&self, event: ReloadEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognition_core::{FieldSpec, FieldType};
    use serde_json::json;
    use std::fs;

    fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_rescan_and_single_reloads_do_not_drop_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "memory.yaml", "active_provider: default\n");
        let store = ConfigStore::load(dir.path()).unwrap();

        std::thread::scope(|scope| {
            let rescanner = store.clone();
            let rescans = scope.spawn(move || {
                for _ in 0..50 {
                    rescanner.reload_all().unwrap();
                }
            });

            for i in 0..50 {
                let path = write(dir.path(), &format!("agent{i}.yaml"), "role: worker\n");
                store.reload_path(&path).unwrap();
            }
            rescans.join().unwrap();
        });

        for i in 0..50 {
            assert!(store.contains(&format!("agent{i}")), "agent{i} was dropped");
        }
        assert!(store.contains("memory"));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = ConfigStore::load("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ConfigError::DirectoryMissing { .. }));
        assert_eq!(err.error_code(), "CONFIG_DIRECTORY_MISSING");
    }

    #[test]
    fn test_bad_file_does_not_block_siblings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "memory.yaml", "active_provider: default\n");
        write(dir.path(), "broken.yaml", "key: [unclosed\n");
        write(dir.path(), "list.yml", "- not\n- a mapping\n");
        write(dir.path(), "readme.md", "# ignored\n");

        let store = ConfigStore::load(dir.path()).unwrap();
        let report = store.load_report();

        assert_eq!(store.names(), vec!["memory".to_string()]);
        assert_eq!(report.loaded, vec!["memory".to_string()]);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_duplicate_stem_keeps_first_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tools.yaml", "source: yaml\n");
        write(dir.path(), "tools.yml", "source: yml\n");

        let store = ConfigStore::load(dir.path()).unwrap();
        assert_eq!(store.get("tools", false).unwrap()["source"], json!("yaml"));
        assert_eq!(store.load_report().failures.len(), 1);
    }

    #[test]
    fn test_get_unknown_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path()).unwrap();
        assert!(matches!(
            store.get("memory", false),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_get_nested_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "gateway.yaml",
            "cache:\n  mode: semantic\n  ttl: 60\nmetadata: flat\n",
        );
        let store = ConfigStore::load(dir.path()).unwrap();

        assert_eq!(store.get_nested("gateway", "cache.mode", json!("x")), json!("semantic"));
        assert_eq!(store.get_nested("gateway", "cache.size", json!(10)), json!(10));
        assert_eq!(store.get_nested("gateway", "metadata.project", json!("p")), json!("p"));
        assert_eq!(store.get_nested("absent", "a.b", json!(null)), json!(null));

        assert_eq!(store.get_nested_as("gateway", "cache.ttl", 0u64), 60);
        assert_eq!(store.get_nested_as("gateway", "cache.mode", 5u64), 5);
    }

    #[test]
    fn test_validate_aggregates_violations() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "service.yaml", "version: 2\n");
        let store = ConfigStore::load(dir.path()).unwrap();

        let schema = Schema::builder()
            .field(FieldSpec::required("version", FieldType::String))
            .field(FieldSpec::required("environment", FieldType::String))
            .build()
            .unwrap();

        match store.validate("service", &schema) {
            Err(ConfigError::Validation { name, violations }) => {
                assert_eq!(name, "service");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_reload_path_keeps_previous_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "memory.yaml", "active_provider: default\n");
        let store = ConfigStore::load(dir.path()).unwrap();
        let mut events = store.subscribe();

        fs::write(&path, "active_provider: [broken\n").unwrap();
        assert!(store.reload_path(&path).is_err());
        assert_eq!(
            store.get("memory", false).unwrap()["active_provider"],
            json!("default")
        );
        assert!(matches!(
            events.try_recv(),
            Ok(ReloadEvent::Failed { ref name, .. }) if name == "memory"
        ));

        fs::write(&path, "active_provider: cloud\n").unwrap();
        store.reload_path(&path).unwrap();
        assert_eq!(
            store.get("memory", false).unwrap()["active_provider"],
            json!("cloud")
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ReloadEvent::Reloaded {
                name: "memory".to_string()
            }
        );
    }

    #[test]
    fn test_reload_all_keeps_previous_for_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tools.yaml", "catalog_url: http://a\n");
        let store = ConfigStore::load(dir.path()).unwrap();

        fs::write(&path, "catalog_url: [unclosed\n").unwrap();
        let report = store.reload_all().unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            store.get("tools", false).unwrap()["catalog_url"],
            json!("http://a")
        );
    }
}
