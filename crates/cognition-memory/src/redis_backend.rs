//! Redis as a [`RemoteBackend`].
//!
//! Values are stored as JSON strings under `{key_prefix}{key}` on a single
//! multiplexed connection, which is cheap to clone per operation.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ErrorKind, RedisError};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::BackendError;
use crate::remote::RemoteBackend;

const DEFAULT_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_KEY_PREFIX: &str = "cognition:";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RedisSection {
    url: String,
    key_prefix: String,
}

impl Default for RedisSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

pub struct RedisBackend {
    client: redis::Client,
    key_prefix: String,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisBackend {
    pub fn new(url: &str, key_prefix: impl Into<String>) -> Result<Self, BackendError> {
        let client = redis::Client::open(url)
            .map_err(|e| BackendError::fatal(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            connection: RwLock::new(None),
        })
    }

    /// Build from a provider config block with optional `url` and `key_prefix`.
    pub fn from_config(config: &Value) -> Result<Self, BackendError> {
        let section = RedisSection::deserialize(config)
            .map_err(|e| BackendError::fatal(format!("invalid redis config: {e}")))?;
        Self::new(&section.url, section.key_prefix)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, BackendError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| BackendError::retryable("redis connection closed"))
    }
}

fn classify(err: RedisError) -> BackendError {
    match err.kind() {
        ErrorKind::AuthenticationFailed | ErrorKind::InvalidClientConfig => {
            BackendError::fatal(err.to_string())
        }
        _ => BackendError::retryable(err.to_string()),
    }
}

#[async_trait]
impl RemoteBackend for RedisBackend {
    fn label(&self) -> &str {
        "redis"
    }

    async fn open(&self) -> Result<(), BackendError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(classify)?;
        *self.connection.write().await = Some(conn);
        Ok(())
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), BackendError> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| BackendError::fatal(format!("value is not serializable: {e}")))?;
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(self.full_key(key), encoded)
            .await
            .map_err(classify)
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>, BackendError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.full_key(key)).await.map_err(classify)?;
        raw.map(|s| {
            serde_json::from_str(&s)
                .map_err(|e| BackendError::fatal(format!("stored value is not JSON: {e}")))
        })
        .transpose()
    }

    async fn close(&self) {
        self.connection.write().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config_defaults() {
        let backend = RedisBackend::from_config(&json!({})).unwrap();
        assert_eq!(backend.full_key("session"), "cognition:session");
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let err = RedisBackend::from_config(&json!({"url": "not a url"})).err().unwrap();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_string_url_is_fatal() {
        let err = RedisBackend::from_config(&json!({"url": 6379, "retry": {"max_attempts": 2}}))
            .err()
            .unwrap();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_operations_before_open_are_retryable() {
        let backend = RedisBackend::from_config(&json!({"key_prefix": "t:"})).unwrap();
        let err = backend.fetch("k").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
