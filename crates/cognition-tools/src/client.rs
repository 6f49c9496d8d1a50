//! HTTP transport for the tool catalog and tool endpoints.

use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::descriptor::ToolDescriptor;
use crate::error::ClientError;

/// Default timeout for HTTP requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for `GET {base}/tools` and tool invocations.
#[derive(Clone)]
pub struct CatalogClient {
    base_url: Url,
    http: Client,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl CatalogClient {
    /// Create a client for the catalog at `base_url`.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ClientError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|source| ClientError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::NotABase {
                url: raw.to_string(),
            });
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("cognition-tools/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn catalog_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("tools");
        }
        url
    }

    /// Resolve a descriptor's endpoint. Absolute URLs are used as is; relative
    /// ones are resolved against the catalog base.
    pub fn resolve_endpoint(&self, endpoint: &str) -> Result<Url, ClientError> {
        let resolved = match Url::parse(endpoint) {
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base_url.join(endpoint),
            other => other,
        };
        resolved.map_err(|source| ClientError::InvalidUrl {
            url: endpoint.to_string(),
            source,
        })
    }

    /// Fetch the ordered descriptor list.
    pub async fn fetch_catalog(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let url = self.catalog_url();
        debug!(url = %url, "Fetching tool catalog");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(ClientError::Decode)
    }

    /// POST `arguments` to `endpoint` and decode the JSON response.
    pub async fn call(&self, endpoint: &Url, arguments: &Value) -> Result<Value, ClientError> {
        debug!(url = %endpoint, "Invoking tool");

        let response = self
            .http
            .post(endpoint.clone())
            .json(arguments)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(ClientError::Decode)
    }

    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}
