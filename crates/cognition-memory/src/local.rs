use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cognition_config::ProviderKind;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    CapabilitySet, ConnectionState, ContextSnapshot, MemoryProvider, SearchHit,
};

/// Process-local provider backed by a `HashMap`.
///
/// Always connected and supports every capability. Data is lost when the
/// process exits. Clones share the same storage.
///
/// # Example
///
/// ```rust
/// use cognition_memory::{LocalProvider, MemoryProvider};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let memory = LocalProvider::new("default");
/// memory.set("session_id", json!("abc123")).await.unwrap();
/// assert_eq!(memory.get("session_id").await.unwrap(), Some(json!("abc123")));
/// # });
/// ```
#[derive(Clone)]
pub struct LocalProvider {
    name: String,
    store: Arc<RwLock<HashMap<String, Value>>>,
}

impl LocalProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(&self, e: impl std::fmt::Display) -> ProviderError {
        ProviderError::Backend {
            provider: self.name.clone(),
            message: format!("lock poisoned: {e}"),
            retryable: false,
        }
    }
}

impl std::fmt::Debug for LocalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}

/// Keys containing `query`, best match first.
///
/// The score is the fraction of the key covered by the query, so an exact
/// match scores 1.0. Ties are ordered by key.
fn rank_by_key(entries: &HashMap<String, Value>, query: &str) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = entries
        .iter()
        .filter(|(key, _)| key.contains(query))
        .map(|(key, value)| SearchHit {
            key: key.clone(),
            value: value.clone(),
            score: if key.is_empty() {
                1.0
            } else {
                query.chars().count() as f64 / key.chars().count() as f64
            },
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    hits
}

#[async_trait]
impl MemoryProvider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    async fn connect(&self) -> ProviderResult<()> {
        debug!(provider = %self.name, "using in-process memory");
        Ok(())
    }

    async fn set(&self, key: &str, value: Value) -> ProviderResult<()> {
        let mut store = self.store.write().map_err(|e| self.poisoned(e))?;
        store.insert(key.to_string(), value);
        debug!(provider = %self.name, key, "stored value");
        Ok(())
    }

    async fn get(&self, key: &str) -> ProviderResult<Option<Value>> {
        let store = self.store.read().map_err(|e| self.poisoned(e))?;
        Ok(store.get(key).cloned())
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchHit>> {
        let store = self.store.read().map_err(|e| self.poisoned(e))?;
        Ok(rank_by_key(&store, query))
    }

    async fn get_context(&self, kind: &str) -> ProviderResult<ContextSnapshot> {
        let store = self.store.read().map_err(|e| self.poisoned(e))?;
        let mut keys: Vec<&String> = store.keys().collect();
        keys.sort();
        let data: Map<String, Value> = keys
            .into_iter()
            .map(|k| (k.clone(), store[k].clone()))
            .collect();
        Ok(ContextSnapshot::new(kind, Value::Object(data)))
    }
}
