//! Registry of remote tools loaded from a catalog.
//!
//! The registry holds a snapshot of [`ToolHandle`]s behind an [`ArcSwap`].
//! [`ToolRegistry::refresh`] builds a complete new snapshot and swaps it in
//! only when every descriptor was accepted, so readers see either the old
//! catalog or the new one.

use arc_swap::{ArcSwap, ArcSwapOption};
use cognition_config::ToolSettings;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{CatalogClient, DEFAULT_TIMEOUT};
use crate::descriptor::ToolDescriptor;
use crate::error::{ToolError, ToolResult};
use crate::handle::ToolHandle;

#[derive(Debug, Default)]
struct Catalog {
    order: Vec<String>,
    tools: HashMap<String, Arc<ToolHandle>>,
}

/// Builder for [`ToolRegistry`].
#[derive(Debug, Clone)]
pub struct ToolRegistryBuilder {
    catalog_url: Option<String>,
    cache_enabled: bool,
    timeout: Duration,
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self {
            catalog_url: None,
            cache_enabled: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Registry-wide caching switch. When off, no tool gets a cache predicate.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build an empty registry. Call [`ToolRegistry::refresh`] to load tools.
    pub fn build(self) -> ToolResult<ToolRegistry> {
        let url = self
            .catalog_url
            .ok_or_else(|| ToolError::catalog("catalog_url is not configured"))?;
        let client = CatalogClient::new(&url, self.timeout)
            .map_err(|e| ToolError::catalog(e.to_string()))?;

        Ok(ToolRegistry {
            client: ArcSwapOption::from_pointee(client),
            catalog: ArcSwap::from_pointee(Catalog::default()),
            cache_enabled: self.cache_enabled,
        })
    }
}

/// Remote tools with synthesized argument validation and cache policies.
///
/// All operations take `&self` and are safe to call concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use cognition_tools::ToolRegistry;
/// use serde_json::json;
///
/// # async fn run() -> cognition_tools::ToolResult<()> {
/// let tools = ToolRegistry::builder()
///     .catalog_url("http://localhost:9000")
///     .build()?;
///
/// tools.refresh().await?;
/// let args = json!({"text": "hello"});
/// let reply = tools.invoke("echo", &args).await?;
/// if tools.should_cache("echo", &args, &reply)? {
///     // store the reply
/// }
/// tools.close();
/// # Ok(())
/// # }
/// ```
pub struct ToolRegistry {
    client: ArcSwapOption<CatalogClient>,
    catalog: ArcSwap<Catalog>,
    cache_enabled: bool,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.catalog.load().order)
            .field("cache_enabled", &self.cache_enabled)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Build from the `tools` document settings.
    pub fn from_settings(settings: &ToolSettings) -> ToolResult<Self> {
        let mut builder = Self::builder().cache_enabled(settings.cache_enabled);
        if let Some(url) = &settings.catalog_url {
            builder = builder.catalog_url(url);
        }
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        builder.build()
    }

    fn client(&self) -> ToolResult<Arc<CatalogClient>> {
        self.client.load_full().ok_or(ToolError::RegistryClosed)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Fetch the catalog and replace the snapshot.
    ///
    /// Returns the number of tools loaded.
    ///
    /// # Errors
    ///
    /// `CatalogUnavailable` when the catalog cannot be fetched or decoded,
    /// or when any descriptor is invalid (empty name, duplicate name, unknown
    /// parameter type, unusable endpoint). The previous snapshot stays in
    /// place. `RegistryClosed` if the registry was closed, including while
    /// the catalog was being fetched.
    pub async fn refresh(&self) -> ToolResult<usize> {
        let client = self.client()?;
        let descriptors = client.fetch_catalog().await.map_err(|e| {
            warn!(error = %e, "tool catalog refresh failed");
            ToolError::catalog(e.to_string())
        })?;

        let catalog = self.build_catalog(&client, descriptors).inspect_err(|e| {
            warn!(error = %e, "tool catalog rejected");
        })?;

        if self.is_closed() {
            return Err(ToolError::RegistryClosed);
        }
        let count = catalog.order.len();
        self.catalog.store(Arc::new(catalog));

        // close() swaps the client out before clearing the snapshot, so a
        // close that raced the store above is visible here.
        if self.is_closed() {
            self.catalog.store(Arc::new(Catalog::default()));
            return Err(ToolError::RegistryClosed);
        }
        info!(tools = count, "tool catalog refreshed");
        Ok(count)
    }

    fn build_catalog(
        &self,
        client: &CatalogClient,
        descriptors: Vec<ToolDescriptor>,
    ) -> ToolResult<Catalog> {
        let mut catalog = Catalog::default();

        for descriptor in descriptors {
            let name = descriptor.name.clone();
            if name.trim().is_empty() {
                return Err(ToolError::catalog("tool with an empty name"));
            }
            if catalog.tools.contains_key(&name) {
                return Err(ToolError::catalog(format!("duplicate tool name '{name}'")));
            }

            let endpoint = client
                .resolve_endpoint(&descriptor.endpoint)
                .map_err(|e| ToolError::catalog(format!("tool '{name}': {e}")))?;
            let handle = ToolHandle::build(descriptor, endpoint, self.cache_enabled)
                .map_err(|e| ToolError::catalog(format!("tool '{name}': {e}")))?;

            debug!(
                tool = %name,
                parameters = handle.schema().fields().len(),
                cacheable = handle.cache_predicate().is_some(),
                "registered tool"
            );
            catalog.order.push(name.clone());
            catalog.tools.insert(name, Arc::new(handle));
        }

        Ok(catalog)
    }

    /// Tool names from the last successful refresh, in catalog order.
    pub fn list(&self) -> Vec<String> {
        self.catalog.load().order.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolHandle>> {
        self.catalog.load().tools.get(name).cloned()
    }

    fn handle(&self, name: &str) -> ToolResult<Arc<ToolHandle>> {
        self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })
    }

    /// Validate `arguments` and call the tool.
    ///
    /// The decoded response body is returned unchanged. No retries.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolResult<Value> {
        let client = self.client()?;
        let handle = self.handle(name)?;

        handle
            .schema()
            .validate(arguments)
            .map_err(|violations| ToolError::InvalidArguments {
                tool: name.to_string(),
                violations,
            })?;

        client
            .call(handle.endpoint(), arguments)
            .await
            .map_err(|e| {
                warn!(tool = %name, error = %e, status = ?e.status(), "tool call failed");
                ToolError::execution(name, e.to_string())
            })
    }

    /// Whether the caller may cache this call and result.
    ///
    /// Always `false` for tools without caching enabled.
    pub fn should_cache(&self, name: &str, arguments: &Value, result: &Value) -> ToolResult<bool> {
        if self.is_closed() {
            return Err(ToolError::RegistryClosed);
        }
        Ok(self.handle(name)?.is_cacheable(arguments, result))
    }

    /// Release the HTTP transport and clear the snapshot.
    ///
    /// Only the first call releases anything and returns `true`. Calls
    /// already in flight finish on the transport they started with.
    pub fn close(&self) -> bool {
        match self.client.swap(None) {
            Some(_) => {
                self.catalog.store(Arc::new(Catalog::default()));
                info!("tool registry closed");
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.client.load().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_catalog_url() {
        let err = ToolRegistry::from_settings(&ToolSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "TOOL_CATALOG_UNAVAILABLE");
    }

    #[test]
    fn test_close_happens_once() {
        let registry = ToolRegistry::builder()
            .catalog_url("http://localhost:9000")
            .build()
            .unwrap();

        assert!(!registry.is_closed());
        assert!(registry.close());
        assert!(!registry.close());
        assert!(registry.is_closed());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_operations_after_close() {
        let registry = ToolRegistry::builder()
            .catalog_url("http://localhost:9000")
            .build()
            .unwrap();
        registry.close();

        let err = tokio_test::block_on(registry.refresh()).unwrap_err();
        assert_eq!(err, ToolError::RegistryClosed);
        let err = tokio_test::block_on(registry.invoke("echo", &Value::Null)).unwrap_err();
        assert_eq!(err, ToolError::RegistryClosed);
        assert_eq!(
            registry.should_cache("echo", &Value::Null, &Value::Null),
            Err(ToolError::RegistryClosed)
        );
    }

    #[test]
    fn test_unknown_tool() {
        let registry = ToolRegistry::builder()
            .catalog_url("http://localhost:9000")
            .build()
            .unwrap();
        let err = tokio_test::block_on(registry.invoke("echo", &Value::Null)).unwrap_err();
        assert_eq!(err.error_code(), "TOOL_NOT_FOUND");
    }
}
