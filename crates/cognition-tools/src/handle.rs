use cognition_core::Schema;
use serde_json::{Map, Value};
use url::Url;

use crate::descriptor::ToolDescriptor;
use crate::error::DescriptorError;

/// Decides whether a tool call and its result may be cached by the caller.
///
/// With no rules every call is cacheable. Each rule key that appears in the
/// arguments must equal the rule's literal; rule keys absent from the
/// arguments do not block caching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachePredicate {
    rules: Map<String, Value>,
}

impl CachePredicate {
    pub fn new(rules: Option<Map<String, Value>>) -> Self {
        Self {
            rules: rules.unwrap_or_default(),
        }
    }

    pub fn rules(&self) -> &Map<String, Value> {
        &self.rules
    }

    /// Evaluate the predicate. The result is not inspected.
    pub fn allows(&self, arguments: &Value, _result: &Value) -> bool {
        let Some(arguments) = arguments.as_object() else {
            return self.rules.is_empty();
        };
        self.rules.iter().all(|(key, expected)| {
            arguments
                .get(key)
                .is_none_or(|actual| actual == expected)
        })
    }
}

/// A validated, callable tool built from a [`ToolDescriptor`].
#[derive(Debug, Clone)]
pub struct ToolHandle {
    descriptor: ToolDescriptor,
    endpoint: Url,
    schema: Schema,
    cache: Option<CachePredicate>,
}

impl ToolHandle {
    /// Build a handle. `caching_allowed` is the registry-wide switch; the
    /// predicate exists only when both it and the descriptor enable caching.
    pub(crate) fn build(
        descriptor: ToolDescriptor,
        endpoint: Url,
        caching_allowed: bool,
    ) -> Result<Self, DescriptorError> {
        let schema = descriptor.schema()?;
        let cache = (caching_allowed && descriptor.cache_enabled)
            .then(|| CachePredicate::new(descriptor.cache_rules.clone()));
        Ok(Self {
            descriptor,
            endpoint,
            schema,
            cache,
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.description
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// `None` when caching is disabled for this tool.
    pub fn cache_predicate(&self) -> Option<&CachePredicate> {
        self.cache.as_ref()
    }

    pub fn is_cacheable(&self, arguments: &Value, result: &Value) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|predicate| predicate.allows(arguments, result))
    }
}
