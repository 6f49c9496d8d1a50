//! Provider backed by an external memory service over HTTP.
//!
//! # Endpoints
//!
//! | Operation     | Request                                  | Response                          |
//! |---------------|------------------------------------------|-----------------------------------|
//! | `set`         | `PUT {base}/memories/{key}` `{"value"}`  | any 2xx                           |
//! | `get`         | `GET {base}/memories/{key}`              | `{"value": ...}`, 404 when absent |
//! | `search`      | `GET {base}/memories/search?query=q`     | `{"results": [{key,value,score}]}`|
//! | `get_context` | `GET {base}/context/{kind}`              | `{"data": ...}`, 404 when empty   |
//!
//! The service is stateless from the provider's point of view: `connect`
//! only marks the provider ready and no operation is gated on it.

use async_trait::async_trait;
use cognition_config::{ExternalMemorySettings, ProviderKind};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    CapabilitySet, ConnectionState, ContextSnapshot, MemoryProvider, SearchHit, StateCell,
};

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

pub struct ExternalProvider {
    name: String,
    base_url: Url,
    http: Client,
    settings: ExternalMemorySettings,
    state: StateCell,
}

impl std::fmt::Debug for ExternalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ExternalProvider {
    /// Create a provider talking to `base_url` with default settings.
    pub fn new(name: impl Into<String>, base_url: &str) -> ProviderResult<Self> {
        let settings = ExternalMemorySettings {
            base_url: Some(base_url.to_string()),
            ..ExternalMemorySettings::default()
        };
        Self::from_settings(name, &settings)
    }

    /// Create a provider from its configuration block.
    ///
    /// # Errors
    ///
    /// A missing or unparsable `base_url`, or an HTTP client that cannot be
    /// built, is reported as a non-retryable backend error.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &ExternalMemorySettings,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let misconfigured = |message: String| ProviderError::Backend {
            provider: name.clone(),
            message,
            retryable: false,
        };

        let raw_url = settings
            .base_url
            .as_deref()
            .ok_or_else(|| misconfigured("base_url is not configured".to_string()))?;
        let base_url = Url::parse(raw_url)
            .map_err(|e| misconfigured(format!("invalid base_url '{raw_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(misconfigured(format!("base_url '{raw_url}' cannot be a base")));
        }

        let timeout = match settings.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("cognition-memory/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| misconfigured(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            name,
            base_url,
            http,
            settings: settings.clone(),
            state: StateCell::new(ConnectionState::Disconnected),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn settings(&self) -> &ExternalMemorySettings {
        &self.settings
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        ProviderError::Backend {
            provider: self.name.clone(),
            message: format!("request failed: {e}"),
            retryable: e.is_timeout() || e.is_connect(),
        }
    }

    async fn status_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ProviderError::Backend {
            provider: self.name.clone(),
            message: format!("HTTP {status}: {body}"),
            retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    async fn decode(&self, response: reqwest::Response) -> ProviderResult<Value> {
        response.json().await.map_err(|e| ProviderError::Backend {
            provider: self.name.clone(),
            message: format!("undecodable response: {e}"),
            retryable: false,
        })
    }

    /// GET returning `None` on 404.
    async fn get_optional(&self, url: Url) -> ProviderResult<Option<Value>> {
        debug!(provider = %self.name, url = %url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }
        self.decode(response).await.map(Some)
    }
}

/// Take `field` out of an object body, or use the whole body.
fn unwrap_field(body: Value, field: &str) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(field) => {
            map.remove(field).unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl MemoryProvider for ExternalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::External
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    async fn connect(&self) -> ProviderResult<()> {
        if self.state.get() != ConnectionState::Connected {
            info!(
                provider = %self.name,
                base_url = %self.base_url,
                storage_path = %self.settings.storage_path.display(),
                embedder = %self.settings.embedder.model,
                "external memory ready"
            );
            self.state.set(ConnectionState::Connected);
        }
        Ok(())
    }

    async fn set(&self, key: &str, value: Value) -> ProviderResult<()> {
        let url = self.endpoint(&["memories", key]);
        debug!(provider = %self.name, url = %url, "PUT");
        let response = self
            .http
            .put(url)
            .json(&json!({ "value": value }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> ProviderResult<Option<Value>> {
        let url = self.endpoint(&["memories", key]);
        Ok(self
            .get_optional(url)
            .await?
            .map(|body| unwrap_field(body, "value")))
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchHit>> {
        let mut url = self.endpoint(&["memories", "search"]);
        url.query_pairs_mut().append_pair("query", query);

        let Some(body) = self.get_optional(url).await? else {
            return Ok(Vec::new());
        };
        let parsed: SearchResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Backend {
                provider: self.name.clone(),
                message: format!("malformed search response: {e}"),
                retryable: false,
            })?;
        Ok(parsed.results)
    }

    async fn get_context(&self, kind: &str) -> ProviderResult<ContextSnapshot> {
        let url = self.endpoint(&["context", kind]);
        match self.get_optional(url).await? {
            Some(body) => Ok(ContextSnapshot::new(kind, unwrap_field(body, "data"))),
            None => Ok(ContextSnapshot::empty(kind)),
        }
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        self.state.set(ConnectionState::Disconnected);
        Ok(())
    }
}
