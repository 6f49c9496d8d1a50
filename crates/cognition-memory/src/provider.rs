//! The provider contract.
//!
//! Every memory backend implements [`MemoryProvider`]. Operations a provider
//! does not support keep the default implementation, which fails with
//! [`ProviderError::CapabilityNotSupported`], and are left out of its
//! [`CapabilitySet`].

use crate::error::{ProviderError, ProviderResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use cognition_config::ProviderKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// A single provider operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Connect,
    Set,
    Get,
    Search,
    GetContext,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Connect,
        Capability::Set,
        Capability::Get,
        Capability::Search,
        Capability::GetContext,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Connect => "connect",
            Capability::Set => "set",
            Capability::Get => "get",
            Capability::Search => "search",
            Capability::GetContext => "get_context",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subset of [`Capability`] values, stored as a bit set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::from_iter(Capability::ALL)
    }

    /// `connect`, `set` and `get`.
    pub fn key_value() -> Self {
        Self::from_iter([Capability::Connect, Capability::Set, Capability::Get])
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0 |= capability.bit();
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Connection lifecycle of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// A non-retryable error ended the last connection attempt.
    Failed = 3,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Lock-free cell holding a [`ConnectionState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub key: String,
    pub value: Value,
    pub score: f64,
}

/// Structured context returned by `get_context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl ContextSnapshot {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Snapshot with no data, a valid result for providers without context.
    pub fn empty(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Object(serde_json::Map::new()))
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Point-in-time description of a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    pub capabilities: CapabilitySet,
    pub state: ConnectionState,
    pub retry_policy: Option<RetryPolicy>,
}

/// A named memory backend.
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    fn capabilities(&self) -> CapabilitySet;

    fn state(&self) -> ConnectionState;

    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }

    /// Establish the connection. Calling it while connected is a no-op.
    async fn connect(&self) -> ProviderResult<()>;

    async fn set(&self, key: &str, value: Value) -> ProviderResult<()>;

    async fn get(&self, key: &str) -> ProviderResult<Option<Value>>;

    async fn search(&self, _query: &str) -> ProviderResult<Vec<SearchHit>> {
        Err(ProviderError::unsupported(self.name(), Capability::Search))
    }

    async fn get_context(&self, _kind: &str) -> ProviderResult<ContextSnapshot> {
        Err(ProviderError::unsupported(self.name(), Capability::GetContext))
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        Ok(())
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name().to_string(),
            kind: self.kind(),
            capabilities: self.capabilities(),
            state: self.state(),
            retry_policy: self.retry_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set() {
        let set = CapabilitySet::key_value();
        assert!(set.contains(Capability::Get));
        assert!(!set.contains(Capability::Search));
        assert_eq!(set.iter().count(), 3);
        assert_eq!(CapabilitySet::all().iter().count(), 5);
        assert_eq!(
            serde_json::to_value(set.with(Capability::GetContext)).unwrap(),
            serde_json::json!(["connect", "set", "get", "get_context"])
        );
    }

    #[test]
    fn test_state_cell_round_trip() {
        let cell = StateCell::new(ConnectionState::Disconnected);
        cell.set(ConnectionState::Failed);
        assert_eq!(cell.get(), ConnectionState::Failed);
    }

    #[test]
    fn test_context_snapshot_serializes_type_field() {
        let snapshot = ContextSnapshot::empty("short_term");
        assert!(snapshot.is_empty());
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            serde_json::json!({"type": "short_term", "data": {}})
        );
    }
}
