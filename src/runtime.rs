//! The runtime context object.
//!
//! [`Cognition`] owns the configuration store, the memory provider registry
//! and, when a catalog is configured, the tool registry. It is built once at
//! startup and torn down with [`Cognition::shutdown`].

use cognition_config::env::get_env_bool;
use cognition_config::{ConfigStore, ConfigStoreBuilder, LongTermMemory, WatchHandle};
use cognition_memory::ProviderRegistry;
use cognition_tools::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::CognitionResult;

/// Environment variable toggling the directory watcher (default: on)
pub const CONFIG_WATCH_VAR: &str = "COGNITION_CONFIG_WATCH";

/// Builder for [`Cognition`].
#[derive(Debug, Clone)]
pub struct CognitionBuilder {
    config: ConfigStoreBuilder,
    watch: bool,
    connect_memory: bool,
    load_tools: bool,
}

impl Default for CognitionBuilder {
    fn default() -> Self {
        Self {
            config: ConfigStoreBuilder::new(),
            watch: false,
            connect_memory: true,
            load_tools: true,
        }
    }
}

impl CognitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from `CONFIG_DIR`, `COGNITION_CONFIG_DEBOUNCE_MS` and
    /// `COGNITION_CONFIG_WATCH`.
    pub fn from_env() -> CognitionResult<Self> {
        Ok(Self {
            config: ConfigStoreBuilder::from_env()?,
            watch: get_env_bool(CONFIG_WATCH_VAR)?.unwrap_or(true),
            ..Self::default()
        })
    }

    pub fn config_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config = self.config.directory(directory);
        self
    }

    pub fn config_store(mut self, builder: ConfigStoreBuilder) -> Self {
        self.config = builder;
        self
    }

    /// Watch the configuration directory for changes. Needs a tokio runtime.
    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Connect the active memory provider during `build`.
    pub fn connect_memory(mut self, connect: bool) -> Self {
        self.connect_memory = connect;
        self
    }

    /// Fetch the tool catalog during `build` when `catalog_url` is set.
    pub fn load_tools(mut self, load: bool) -> Self {
        self.load_tools = load;
        self
    }

    /// Load configuration and bring up the registries.
    ///
    /// # Errors
    ///
    /// - the configuration directory is missing
    /// - long-term memory is enabled as external but has no connection string
    /// - connecting the active memory provider fails
    /// - the tool registry cannot be created from its settings
    ///
    /// An unreachable tool catalog is not fatal: the registry starts empty
    /// and can be refreshed later.
    pub async fn build(self) -> CognitionResult<Cognition> {
        let config = self.config.load()?;
        let report = config.load_report();
        if !report.is_clean() {
            warn!(
                failures = report.failures.len(),
                "some configuration documents failed to load"
            );
        }

        let memory_settings = config.memory_settings();
        let long_term = memory_settings.resolve_long_term()?;

        let memory = Arc::new(ProviderRegistry::from_settings(&memory_settings));
        if self.connect_memory {
            memory.connect().await?;
        }

        let tool_settings = config.tool_settings();
        let tools = match tool_settings.catalog_url {
            Some(_) => {
                let registry = Arc::new(ToolRegistry::from_settings(&tool_settings)?);
                if self.load_tools
                    && let Err(e) = registry.refresh().await
                {
                    warn!(error = %e, "tool catalog not loaded, starting with no tools");
                }
                Some(registry)
            }
            None => None,
        };

        let watcher = if self.watch {
            Some(config.start_watching()?)
        } else {
            None
        };

        info!(
            config_dir = %config.directory().display(),
            documents = config.names().len(),
            memory = %memory.active_name(),
            tools = tools.as_ref().map_or(0, |t| t.list().len()),
            watching = watcher.is_some(),
            "cognition runtime ready"
        );

        Ok(Cognition {
            config,
            memory,
            tools,
            long_term,
            watcher,
        })
    }
}

/// Explicit runtime context. No global state.
#[derive(Debug)]
pub struct Cognition {
    config: ConfigStore,
    memory: Arc<ProviderRegistry>,
    tools: Option<Arc<ToolRegistry>>,
    long_term: LongTermMemory,
    watcher: Option<WatchHandle>,
}

impl Cognition {
    pub fn builder() -> CognitionBuilder {
        CognitionBuilder::new()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn memory(&self) -> &Arc<ProviderRegistry> {
        &self.memory
    }

    /// `None` when no `catalog_url` is configured.
    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.tools.as_ref()
    }

    /// Resolved long-term memory backend. Credentials are not read until
    /// [`LongTermMemory::database_password`] is called.
    pub fn long_term_memory(&self) -> &LongTermMemory {
        &self.long_term
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(WatchHandle::is_running)
    }

    /// Stop watching, disconnect every provider and close the tool registry.
    pub async fn shutdown(self) {
        if let Some(watcher) = self.watcher {
            watcher.stop();
        }
        self.memory.shutdown().await;
        if let Some(tools) = &self.tools {
            tools.close();
        }
        info!("cognition runtime stopped");
    }
}
