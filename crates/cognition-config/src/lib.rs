//! # Cognition Config
//!
//! Hot-reloading configuration store for the Cognition runtime.
//!
//! One YAML file per document, named after the file stem. Documents are
//! parsed into `serde_json::Value` trees and replaced atomically on reload;
//! environment overrides are applied when reading, never stored.
//!
//! ```rust,no_run
//! use cognition_config::ConfigStore;
//!
//! # async fn run() -> Result<(), cognition_config::ConfigError> {
//! let store = ConfigStore::builder().directory("config").load()?;
//! let _watcher = store.start_watching()?;
//!
//! let tools = store.tool_settings();
//! let mode = store.get_nested("gateway", "cache.mode", "semantic".into());
//! # let _ = (tools, mode);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod document;
pub mod env;
pub mod error;
pub mod settings;
pub mod store;
pub mod watch;

pub use document::ConfigDocument;
pub use env::{EnvOverrideRule, OverrideRules};
pub use error::{ConfigError, ConfigResult};
pub use settings::{
    DEFAULT_PROVIDER, EmbedderSettings, ExternalMemorySettings, GatewaySettings, LongTermMemory,
    LongTermSettings, MemorySettings, ProviderDeclaration, ProviderKind, ToolSettings,
};
pub use store::{ConfigStore, ConfigStoreBuilder, LoadFailure, LoadReport};
pub use watch::{ReloadEvent, WatchHandle};
