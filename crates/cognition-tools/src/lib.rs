//! # Cognition Tools
//!
//! Remote tools discovered from a catalog service.
//!
//! The catalog (`GET {base}/tools`) lists [`ToolDescriptor`]s. For each one
//! the registry synthesizes an argument [`Schema`](cognition_core::Schema)
//! and, when caching is enabled, a [`CachePredicate`]. Invocations are
//! validated locally and then posted to the tool's endpoint.

pub mod client;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod registry;

pub use client::CatalogClient;
pub use descriptor::{ParameterSpec, ToolDescriptor};
pub use error::{ClientError, DescriptorError, ToolError, ToolResult};
pub use handle::{CachePredicate, ToolHandle};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
