//! Remote provider with bounded connection retries.
//!
//! [`RetryingProvider`] wraps a [`RemoteBackend`] and owns the connection
//! lifecycle. The backend only knows how to open a connection and move
//! values. The provider decides when to retry, how long to wait, and which
//! operations are allowed in which state.

use async_trait::async_trait;
use cognition_config::ProviderKind;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{BackendError, ProviderError, ProviderResult};
use crate::provider::{CapabilitySet, ConnectionState, MemoryProvider, StateCell};
use crate::retry::RetryPolicy;

/// Storage reached over the network.
#[async_trait]
pub trait RemoteBackend: Send + Sync + 'static {
    /// Short label used in logs, for example `redis`.
    fn label(&self) -> &str;

    /// Open (or re-open) the connection.
    async fn open(&self) -> Result<(), BackendError>;

    async fn put(&self, key: &str, value: &Value) -> Result<(), BackendError>;

    async fn fetch(&self, key: &str) -> Result<Option<Value>, BackendError>;

    async fn close(&self) {}
}

/// Provider that connects to a [`RemoteBackend`] with linear backoff.
///
/// - `connect` tries up to `max_attempts` times. A fatal backend error stops
///   immediately and leaves the provider `Failed`; running out of attempts
///   leaves it `Disconnected` and returns `ConnectionExhausted`.
/// - `set` and `get` fail with `NotConnected` unless connected. They never
///   connect on their own.
/// - `search` and `get_context` are not supported.
pub struct RetryingProvider<B: RemoteBackend> {
    name: String,
    backend: B,
    policy: RetryPolicy,
    state: StateCell,
    // Serialises concurrent connect calls.
    connect_lock: Mutex<()>,
}

impl<B: RemoteBackend> RetryingProvider<B> {
    pub fn new(name: impl Into<String>, backend: B, policy: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            backend,
            policy,
            state: StateCell::new(ConnectionState::Disconnected),
            connect_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_connected(&self) -> ProviderResult<()> {
        match self.state.get() {
            ConnectionState::Connected => Ok(()),
            _ => Err(ProviderError::not_connected(&self.name)),
        }
    }

    fn operation_failed(&self, err: BackendError) -> ProviderError {
        warn!(provider = %self.name, backend = self.backend.label(), error = %err, "backend operation failed");
        ProviderError::backend(&self.name, err)
    }
}

/// Resets `Connecting` to `Disconnected` if the connect future is dropped
/// before it settles.
struct ConnectingGuard<'a> {
    state: &'a StateCell,
    settled: bool,
}

impl<'a> ConnectingGuard<'a> {
    fn begin(state: &'a StateCell) -> Self {
        state.set(ConnectionState::Connecting);
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, state: ConnectionState) {
        self.state.set(state);
        self.settled = true;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.set(ConnectionState::Disconnected);
        }
    }
}

#[async_trait]
impl<B: RemoteBackend> MemoryProvider for RetryingProvider<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::key_value()
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        Some(self.policy)
    }

    async fn connect(&self) -> ProviderResult<()> {
        let _lock = self.connect_lock.lock().await;
        if self.state.get() == ConnectionState::Connected {
            return Ok(());
        }

        let guard = ConnectingGuard::begin(&self.state);
        let max_attempts = self.policy.max_attempts;
        info!(provider = %self.name, backend = self.backend.label(), max_attempts, "connecting");

        for attempt in 1..=max_attempts {
            match self.backend.open().await {
                Ok(()) => {
                    guard.settle(ConnectionState::Connected);
                    info!(provider = %self.name, attempt, "connected");
                    return Ok(());
                }
                Err(BackendError::Fatal(message)) => {
                    guard.settle(ConnectionState::Failed);
                    error!(provider = %self.name, attempt, error = %message, "connection failed permanently");
                    return Err(ProviderError::Backend {
                        provider: self.name.clone(),
                        message,
                        retryable: false,
                    });
                }
                Err(BackendError::Retryable(message)) => {
                    if attempt < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            provider = %self.name,
                            attempt,
                            error = %message,
                            retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "connection attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(provider = %self.name, attempt, error = %message, "connection attempt failed");
                    }
                }
            }
        }

        guard.settle(ConnectionState::Disconnected);
        error!(provider = %self.name, attempts = max_attempts, "maximum connection attempts exceeded");
        Err(ProviderError::ConnectionExhausted {
            provider: self.name.clone(),
            attempts: max_attempts,
        })
    }

    async fn set(&self, key: &str, value: Value) -> ProviderResult<()> {
        self.ensure_connected()?;
        self.backend
            .put(key, &value)
            .await
            .map_err(|e| self.operation_failed(e))?;
        debug!(provider = %self.name, key, "stored value");
        Ok(())
    }

    async fn get(&self, key: &str) -> ProviderResult<Option<Value>> {
        self.ensure_connected()?;
        self.backend
            .fetch(key)
            .await
            .map_err(|e| self.operation_failed(e))
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        let _lock = self.connect_lock.lock().await;
        if self.state.get() == ConnectionState::Connected {
            self.backend.close().await;
            info!(provider = %self.name, "disconnected");
        }
        self.state.set(ConnectionState::Disconnected);
        Ok(())
    }
}
