//! Registry behaviour across provider kinds.

use async_trait::async_trait;
use cognition_config::{MemorySettings, ProviderDeclaration, ProviderKind};
use cognition_memory::{
    BackendError, ConnectionState, ExternalProvider, LocalProvider, ProviderRegistry,
    RemoteBackend, RetryPolicy, RetryingProvider,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Backend that is reachable and keeps values in memory.
#[derive(Default)]
struct InMemoryBackend {
    values: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl RemoteBackend for InMemoryBackend {
    fn label(&self) -> &str {
        "in-memory"
    }

    async fn open(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), BackendError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>, BackendError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }
}

fn remote(name: &str) -> RetryingProvider<InMemoryBackend> {
    RetryingProvider::new(
        name,
        InMemoryBackend::default(),
        RetryPolicy::new(2, 1.0, Duration::from_millis(10)),
    )
}

#[tokio::test]
async fn switching_does_not_connect() {
    let registry = ProviderRegistry::builder().register(remote("cache")).build();

    registry.switch_provider("cache").unwrap();
    let err = registry.set("k", json!(1)).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_CONNECTED");

    registry.connect().await.unwrap();
    registry.set("k", json!(1)).await.unwrap();
    assert_eq!(registry.get("k").await.unwrap(), Some(json!(1)));
}

#[tokio::test]
async fn unsupported_capability_on_remote() {
    let registry = ProviderRegistry::builder()
        .register(remote("cache"))
        .active("cache")
        .build();
    registry.connect().await.unwrap();

    let err = registry.search("k").await.unwrap_err();
    assert_eq!(err.error_code(), "CAPABILITY_NOT_SUPPORTED");
}

#[tokio::test]
async fn duplicate_registration_replaces_provider() {
    let first = LocalProvider::new("notes");
    let registry = ProviderRegistry::builder()
        .register(first)
        .register(remote("notes"))
        .build();

    assert_eq!(registry.names(), &["default".to_string(), "notes".to_string()]);
    let notes = registry.provider("notes").unwrap();
    assert_eq!(notes.kind(), ProviderKind::Remote);
}

#[tokio::test]
async fn shutdown_disconnects_everything() {
    let registry = ProviderRegistry::builder()
        .register(remote("cache"))
        .active("cache")
        .build();
    registry.connect().await.unwrap();
    assert_eq!(registry.active().state(), ConnectionState::Connected);

    registry.shutdown().await;
    assert_eq!(registry.active().state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn settings_with_external_provider_route_to_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/memories/topic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "memory"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = MemorySettings {
        active_provider: "mem0".to_string(),
        providers: vec![ProviderDeclaration {
            name: "mem0".to_string(),
            kind: ProviderKind::External,
            config: json!({ "base_url": server.uri() }),
        }],
        ..MemorySettings::default()
    };

    let registry = ProviderRegistry::from_settings(&settings);
    assert_eq!(registry.active_name(), "mem0");
    registry.connect().await.unwrap();
    assert_eq!(registry.get("topic").await.unwrap(), Some(json!("memory")));

    let descriptor = registry
        .descriptors()
        .into_iter()
        .find(|d| d.name == "mem0")
        .unwrap();
    assert_eq!(descriptor.kind, ProviderKind::External);
    assert_eq!(descriptor.state, ConnectionState::Connected);
}

#[test]
fn external_provider_requires_base_url() {
    assert!(ExternalProvider::new("mem0", "not a url").is_err());
}
