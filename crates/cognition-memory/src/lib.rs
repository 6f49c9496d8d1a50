//! # Cognition Memory
//!
//! Memory providers and the registry that routes operations to the active
//! one.
//!
//! ## Providers
//!
//! - [`LocalProvider`]: in-process map, always available as `default`
//! - [`RetryingProvider`]: any [`RemoteBackend`] with bounded connection
//!   retries (`RedisBackend` with the `redis` feature)
//! - [`ExternalProvider`]: an external memory service over HTTP
//!
//! ```rust
//! use cognition_memory::{LocalProvider, ProviderRegistry};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let registry = ProviderRegistry::builder()
//!     .register(LocalProvider::new("scratch"))
//!     .active("scratch")
//!     .build();
//!
//! registry.connect().await.unwrap();
//! registry.set("topic", json!("rust")).await.unwrap();
//! assert_eq!(registry.get("topic").await.unwrap(), Some(json!("rust")));
//! # });
//! ```

pub mod error;
pub mod external;
pub mod local;
pub mod provider;
#[cfg(feature = "redis")]
pub mod redis_backend;
pub mod registry;
pub mod remote;
pub mod retry;

pub use error::{BackendError, ProviderError, ProviderResult};
pub use external::ExternalProvider;
pub use local::LocalProvider;
pub use provider::{
    Capability, CapabilitySet, ConnectionState, ContextSnapshot, MemoryProvider,
    ProviderDescriptor, SearchHit,
};
#[cfg(feature = "redis")]
pub use redis_backend::RedisBackend;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use remote::{RemoteBackend, RetryingProvider};
pub use retry::RetryPolicy;
