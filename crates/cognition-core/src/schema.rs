//! Runtime schema synthesis.
//!
//! A [`Schema`] is built from an explicit field list through [`SchemaBuilder`].
//! The builder turns the list into a JSON Schema document (`type: object`,
//! `properties`, `required`) and compiles it with `jsonschema`. The same
//! builder backs structural validation of configuration documents and
//! argument validation of remote tools, so both report violations in the
//! same shape.
//!
//! Validation never stops at the first problem: every violation found is
//! returned.
//!
//! # Example
//!
//! ```rust
//! use cognition_core::schema::{FieldSpec, FieldType, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .field(FieldSpec::required("text", FieldType::String))
//!     .field(FieldSpec::optional("lang", FieldType::String))
//!     .build()
//!     .unwrap();
//!
//! assert!(schema.validate(&json!({"text": "hi"})).is_ok());
//! assert_eq!(schema.validate(&json!({})).unwrap_err().len(), 1);
//! ```

use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Primitive types a schema field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Accepts any value, including `null`.
    Any,
}

impl FieldType {
    /// Parse a declared type name.
    ///
    /// Accepts JSON-schema style names (`string`, `integer`, ...) as well as
    /// the short aliases tool catalogs commonly emit (`str`, `int`, `float`,
    /// `bool`, `dict`, `list`). Matching is case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(FieldType::String),
            "integer" | "int" => Some(FieldType::Integer),
            "number" | "float" | "double" => Some(FieldType::Number),
            "boolean" | "bool" => Some(FieldType::Boolean),
            "object" | "dict" | "map" | "mapping" => Some(FieldType::Object),
            "array" | "list" | "sequence" => Some(FieldType::Array),
            "any" => Some(FieldType::Any),
            _ => None,
        }
    }

    /// Canonical lowercase name, as used for the JSON Schema `type` keyword.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Any => "any",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the JSON kind of `value`, for log and error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    path: Vec<String>,
    field_type: FieldType,
    required: bool,
    description: String,
}

impl FieldSpec {
    /// A required top-level field.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: vec![name.into()],
            field_type,
            required: true,
            description: String::new(),
        }
    }

    /// An optional top-level field. `null` is accepted for optional fields.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// A field addressed by a dotted path such as `cache.mode`.
    ///
    /// Each segment becomes a nested `properties` entry. Parents of a
    /// required field are required objects; parents of an optional field
    /// may be absent or `null`.
    pub fn nested(dotted_path: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            path: dotted_path.split('.').map(str::to_string).collect(),
            field_type,
            required,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Dotted display form of the field path.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn leaf_schema(&self) -> Value {
        let mut schema = Map::new();
        match (self.field_type, self.required) {
            (FieldType::Any, _) => {}
            (ty, true) => {
                schema.insert("type".into(), json!(ty.name()));
            }
            (ty, false) => {
                schema.insert("type".into(), json!([ty.name(), "null"]));
            }
        }
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        Value::Object(schema)
    }
}

/// A single schema violation as reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors raised while compiling a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Builder producing a [`Schema`] from a field list.
#[derive(Debug, Default, Clone)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. A later field with the same path replaces the earlier one.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|existing| existing.path != spec.path);
        self.fields.push(spec);
        self
    }

    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        for spec in specs {
            self = self.field(spec);
        }
        self
    }

    /// The JSON Schema document for the current field list.
    pub fn to_json_schema(&self) -> Value {
        let mut root = object_node(false);
        for spec in &self.fields {
            insert_field(&mut root, &spec.path, spec);
        }
        Value::Object(root)
    }

    /// Compile the field list.
    ///
    /// # Errors
    ///
    /// `SchemaError::Invalid` if the generated document does not compile.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let document = self.to_json_schema();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&document)
            .map_err(|err| SchemaError::Invalid(err.to_string()))?;

        Ok(Schema {
            fields: self.fields,
            document,
            validator: Arc::new(validator),
        })
    }
}

fn object_node(nullable: bool) -> Map<String, Value> {
    let mut node = Map::new();
    let ty = if nullable {
        json!(["object", "null"])
    } else {
        json!("object")
    };
    node.insert("type".into(), ty);
    node.insert("properties".into(), Value::Object(Map::new()));
    node
}

fn mark_required(node: &mut Map<String, Value>, name: &str) {
    let required = node
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(names) = required
        && !names.iter().any(|n| n.as_str() == Some(name))
    {
        names.push(Value::String(name.to_string()));
    }
}

fn insert_field(node: &mut Map<String, Value>, path: &[String], spec: &FieldSpec) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if spec.required {
        mark_required(node, head);
    }

    let properties = node
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(properties) = properties else {
        return;
    };

    if rest.is_empty() {
        properties.insert(head.clone(), spec.leaf_schema());
        return;
    }

    let child = properties
        .entry(head.clone())
        .or_insert_with(|| Value::Object(object_node(!spec.required)));
    if let Value::Object(child) = child {
        if !child.contains_key("properties") {
            *child = object_node(!spec.required);
        }
        if spec.required {
            child.insert("type".into(), json!("object"));
        }
        insert_field(child, rest, spec);
    }
}

/// A compiled validator over JSON objects.
///
/// Undeclared fields are accepted and ignored.
#[derive(Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    document: Value,
    validator: Arc<Validator>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .finish()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// The compiled JSON Schema document.
    pub fn json_schema(&self) -> &Value {
        &self.document
    }

    /// Names of required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(FieldSpec::name)
            .collect()
    }

    /// Validate `value`, collecting every violation.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(value)
            .map(|err| Violation::new(err.to_string()))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validate an already-destructured object.
    pub fn validate_object(&self, map: &Map<String, Value>) -> Result<(), Vec<Violation>> {
        self.validate(&Value::Object(map.clone()))
    }
}
