//! Named providers with one active provider.
//!
//! The registry always contains the local `default` provider. Exactly one
//! provider is active; the pointer lives in an [`ArcSwap`] so switching is a
//! single atomic store and in-flight calls finish on the provider they
//! started with.

use arc_swap::ArcSwap;
use cognition_config::{DEFAULT_PROVIDER, MemorySettings, ProviderKind};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::external::ExternalProvider;
use crate::local::LocalProvider;
use crate::provider::{ContextSnapshot, MemoryProvider, ProviderDescriptor, SearchHit};

#[cfg(feature = "redis")]
use crate::{redis_backend::RedisBackend, remote::RetryingProvider, retry::RetryPolicy};

type SharedProvider = Arc<dyn MemoryProvider>;

struct Active {
    name: String,
    provider: SharedProvider,
}

/// Builder for [`ProviderRegistry`].
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<SharedProvider>,
    active: Option<String>,
}

impl ProviderRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A later provider with the same name replaces an
    /// earlier one.
    pub fn register<P: MemoryProvider + 'static>(self, provider: P) -> Self {
        self.register_shared(Arc::new(provider))
    }

    pub fn register_shared(mut self, provider: SharedProvider) -> Self {
        if let Some(pos) = self
            .providers
            .iter()
            .position(|p| p.name() == provider.name())
        {
            warn!(provider = provider.name(), "replacing previously registered provider");
            self.providers.remove(pos);
        }
        self.providers.push(provider);
        self
    }

    /// Provider to activate. Unknown names fall back to `default`.
    pub fn active(mut self, name: impl Into<String>) -> Self {
        self.active = Some(name.into());
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let mut order: Vec<String> = Vec::with_capacity(self.providers.len() + 1);
        let mut providers: HashMap<String, SharedProvider> = HashMap::new();

        if !self.providers.iter().any(|p| p.name() == DEFAULT_PROVIDER) {
            order.push(DEFAULT_PROVIDER.to_string());
            providers.insert(
                DEFAULT_PROVIDER.to_string(),
                Arc::new(LocalProvider::new(DEFAULT_PROVIDER)),
            );
        }
        for provider in self.providers {
            order.push(provider.name().to_string());
            providers.insert(provider.name().to_string(), provider);
        }

        let requested = self.active.unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let active_name = if providers.contains_key(&requested) {
            requested
        } else {
            warn!(
                requested = %requested,
                "active provider is not configured, falling back to '{}'",
                DEFAULT_PROVIDER
            );
            DEFAULT_PROVIDER.to_string()
        };

        let mut active_provider = None;
        if let Some(provider) = providers.get(&active_name) {
            active_provider = Some(Arc::clone(provider));
        }
        let active = match active_provider {
            Some(provider) => Active {
                name: active_name,
                provider,
            },
            // The default provider is inserted above, so this only guards the type.
            None => Active {
                name: DEFAULT_PROVIDER.to_string(),
                provider: Arc::new(LocalProvider::new(DEFAULT_PROVIDER)),
            },
        };

        info!(
            providers = order.len(),
            active = %active.name,
            "memory providers initialised"
        );

        ProviderRegistry {
            providers,
            order,
            active: ArcSwap::from_pointee(active),
        }
    }
}

/// Routes memory operations to the active provider.
pub struct ProviderRegistry {
    providers: HashMap<String, SharedProvider>,
    order: Vec<String>,
    active: ArcSwap<Active>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.order)
            .field("active", &self.active_name())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::new()
    }

    /// Build the registry from the `memory` document.
    ///
    /// Declared providers that cannot be constructed are logged and left
    /// out; if the configured active provider is among them, `default`
    /// becomes active.
    pub fn from_settings(settings: &MemorySettings) -> Self {
        let mut builder = Self::builder().active(settings.active_provider.clone());

        for declaration in &settings.providers {
            let name = declaration.name.as_str();
            match declaration.kind {
                ProviderKind::Local => {
                    builder = builder.register(LocalProvider::new(name));
                }
                ProviderKind::External => {
                    let external =
                        cognition_config::ExternalMemorySettings::from_config(&declaration.config);
                    match ExternalProvider::from_settings(name, &external) {
                        Ok(provider) => builder = builder.register(provider),
                        Err(e) => {
                            error!(provider = name, error = %e, "skipping external memory provider")
                        }
                    }
                }
                ProviderKind::Remote => {
                    builder = register_remote(builder, name, &declaration.config);
                }
            }
        }

        builder.build()
    }

    /// Name of the active provider.
    pub fn active_name(&self) -> String {
        self.active.load().name.clone()
    }

    pub fn active(&self) -> SharedProvider {
        Arc::clone(&self.active.load().provider)
    }

    pub fn provider(&self, name: &str) -> Option<SharedProvider> {
        self.providers.get(name).cloned()
    }

    /// Registered names in registration order, `default` first unless it
    /// was registered explicitly.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Make `name` the active provider. Does not connect it.
    ///
    /// # Errors
    ///
    /// `UnknownProvider` if no provider has that name; the active provider
    /// is unchanged.
    pub fn switch_provider(&self, name: &str) -> ProviderResult<()> {
        let provider = self
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
            })?;

        let previous = self.active.swap(Arc::new(Active {
            name: name.to_string(),
            provider,
        }));
        info!(from = %previous.name, to = name, "switched memory provider");
        Ok(())
    }

    pub async fn connect(&self) -> ProviderResult<()> {
        self.active().connect().await
    }

    pub async fn set(&self, key: &str, value: Value) -> ProviderResult<()> {
        self.active().set(key, value).await
    }

    pub async fn get(&self, key: &str) -> ProviderResult<Option<Value>> {
        self.active().get(key).await
    }

    pub async fn search(&self, query: &str) -> ProviderResult<Vec<SearchHit>> {
        self.active().search(query).await
    }

    pub async fn get_context(&self, kind: &str) -> ProviderResult<ContextSnapshot> {
        self.active().get_context(kind).await
    }

    /// Descriptors of every provider, in registration order.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.providers.get(name))
            .map(|p| p.descriptor())
            .collect()
    }

    /// Disconnect every provider. Failures are logged and do not stop the
    /// remaining disconnects.
    pub async fn shutdown(&self) {
        for name in &self.order {
            let Some(provider) = self.providers.get(name) else {
                continue;
            };
            if let Err(e) = provider.disconnect().await {
                warn!(provider = %name, error = %e, "failed to disconnect provider");
            }
        }
        info!("memory providers shut down");
    }
}

#[cfg(feature = "redis")]
fn register_remote(
    builder: ProviderRegistryBuilder,
    name: &str,
    config: &Value,
) -> ProviderRegistryBuilder {
    match RedisBackend::from_config(config) {
        Ok(backend) => builder.register(RetryingProvider::new(
            name,
            backend,
            RetryPolicy::from_config(config),
        )),
        Err(e) => {
            error!(provider = name, error = %e, "skipping remote memory provider");
            builder
        }
    }
}

#[cfg(not(feature = "redis"))]
fn register_remote(
    builder: ProviderRegistryBuilder,
    name: &str,
    _config: &Value,
) -> ProviderRegistryBuilder {
    error!(
        provider = name,
        "remote memory providers need the `redis` feature, skipping"
    );
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ConnectionState;
    use cognition_config::ProviderDeclaration;
    use serde_json::json;

    #[test]
    fn test_default_is_always_present_and_active() {
        let registry = ProviderRegistry::builder().build();
        assert_eq!(registry.names(), &["default".to_string()]);
        assert_eq!(registry.active_name(), "default");
    }

    #[test]
    fn test_unknown_active_falls_back_to_default() {
        let registry = ProviderRegistry::builder()
            .register(LocalProvider::new("scratch"))
            .active("missing")
            .build();
        assert_eq!(registry.active_name(), "default");
    }

    #[test]
    fn test_switch_unknown_leaves_active_untouched() {
        let registry = ProviderRegistry::builder()
            .register(LocalProvider::new("scratch"))
            .active("scratch")
            .build();

        let err = registry.switch_provider("nope").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PROVIDER");
        assert_eq!(registry.active_name(), "scratch");
    }

    #[tokio::test]
    async fn test_operations_follow_the_active_provider() {
        let registry = ProviderRegistry::builder()
            .register(LocalProvider::new("scratch"))
            .build();

        registry.set("k", json!("in default")).await.unwrap();
        registry.switch_provider("scratch").unwrap();
        assert_eq!(registry.get("k").await.unwrap(), None);

        registry.set("k", json!("in scratch")).await.unwrap();
        registry.switch_provider("default").unwrap();
        assert_eq!(registry.get("k").await.unwrap(), Some(json!("in default")));
    }

    #[test]
    fn test_from_settings_skips_unbuildable_providers() {
        let settings = MemorySettings {
            active_provider: "mem0".to_string(),
            providers: vec![
                ProviderDeclaration {
                    name: "mem0".to_string(),
                    kind: ProviderKind::External,
                    config: json!({}),
                },
                ProviderDeclaration {
                    name: "notes".to_string(),
                    kind: ProviderKind::Local,
                    config: json!({}),
                },
            ],
            ..MemorySettings::default()
        };

        let registry = ProviderRegistry::from_settings(&settings);
        assert_eq!(registry.names(), &["default".to_string(), "notes".to_string()]);
        assert_eq!(registry.active_name(), "default");
    }

    #[test]
    fn test_descriptors_in_registration_order() {
        let registry = ProviderRegistry::builder()
            .register(LocalProvider::new("scratch"))
            .build();
        let descriptors = registry.descriptors();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "default");
        assert_eq!(descriptors[1].state, ConnectionState::Connected);
        assert_eq!(descriptors[1].kind, ProviderKind::Local);
    }
}
