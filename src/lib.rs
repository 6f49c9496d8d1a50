//! # Cognition
//!
//! Configuration, memory-provider and remote-tool orchestration for agent
//! runtimes.
//!
//! ## Core Components
//!
//! - **[ConfigStore]**: hot-reloading YAML documents with environment overrides
//! - **[ProviderRegistry]**: named memory providers, one of them active
//! - **[ToolRegistry]**: remote tools with synthesized argument validation
//! - **[Cognition]**: the context object wiring the three together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cognition::Cognition;
//! use serde_json::json;
//!
//! # async fn run() -> cognition::CognitionResult<()> {
//! let runtime = Cognition::builder().config_dir("config").build().await?;
//!
//! runtime.memory().set("session", json!({"user": "ada"})).await?;
//! if let Some(tools) = runtime.tools() {
//!     let reply = tools.invoke("echo", &json!({"text": "hi"})).await?;
//!     println!("{reply}");
//! }
//!
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod runtime;

pub use error::{CognitionError, CognitionResult};
pub use runtime::{Cognition, CognitionBuilder};

pub use cognition_config::{
    ConfigError, ConfigResult, ConfigStore, GatewaySettings, LongTermMemory, MemorySettings,
    ReloadEvent, ToolSettings, WatchHandle,
};
pub use cognition_core::{FieldSpec, FieldType, Schema, SecretString};
pub use cognition_memory::{
    ContextSnapshot, LocalProvider, MemoryProvider, ProviderError, ProviderRegistry,
    ProviderResult, SearchHit,
};
pub use cognition_tools::{CachePredicate, ToolError, ToolRegistry, ToolResult};

#[cfg(feature = "tracing")]
pub use cognition_observability::{ObservabilityConfig, init_observability};
