//! Tool descriptors as published by the catalog.
//!
//! A catalog entry looks like:
//!
//! ```json
//! {
//!   "name": "translate",
//!   "description": "Translate text",
//!   "endpoint": "https://tools.example.com/translate",
//!   "parameters": {
//!     "text": ["string", "Text to translate"],
//!     "lang": {"type": "string", "description": "Target language", "required": false}
//!   },
//!   "cache_enabled": true,
//!   "cache_rules": {"lang": "en"}
//! }
//! ```

use crate::error::DescriptorError;
use cognition_core::{FieldSpec, FieldType, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata describing a remotely hosted tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub endpoint: String,
    /// Parameter name to declaration, in catalog order.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub cache_enabled: bool,
    #[serde(default)]
    pub cache_rules: Option<Map<String, Value>>,
}

/// Accepted shapes of a parameter declaration.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParameter {
    TypeOnly(String),
    Pair(String, String),
    Detailed {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        description: String,
        #[serde(default = "default_required")]
        required: bool,
    },
}

fn default_required() -> bool {
    true
}

/// One parameter after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    /// Normalize a single declaration.
    ///
    /// `["type", "description"]` and a bare `"type"` are required parameters;
    /// the object form may opt out with `"required": false`.
    pub fn parse(name: &str, declaration: &Value) -> Result<Self, DescriptorError> {
        let raw: RawParameter = serde_json::from_value(declaration.clone()).map_err(|_| {
            DescriptorError::MalformedParameter {
                name: name.to_string(),
            }
        })?;

        let (type_name, description, required) = match raw {
            RawParameter::TypeOnly(ty) => (ty, String::new(), true),
            RawParameter::Pair(ty, description) => (ty, description, true),
            RawParameter::Detailed {
                ty,
                description,
                required,
            } => (ty, description, required),
        };

        let field_type =
            FieldType::parse(&type_name).ok_or_else(|| DescriptorError::UnknownType {
                name: name.to_string(),
                type_name: type_name.clone(),
            })?;

        Ok(Self {
            name: name.to_string(),
            field_type,
            description,
            required,
        })
    }

    fn to_field(&self) -> FieldSpec {
        let field = if self.required {
            FieldSpec::required(&self.name, self.field_type)
        } else {
            FieldSpec::optional(&self.name, self.field_type)
        };
        field.with_description(&self.description)
    }
}

impl ToolDescriptor {
    /// Normalized parameter list, in declaration order.
    pub fn parameter_specs(&self) -> Result<Vec<ParameterSpec>, DescriptorError> {
        self.parameters
            .iter()
            .map(|(name, declaration)| ParameterSpec::parse(name, declaration))
            .collect()
    }

    /// Argument validator for this tool.
    pub fn schema(&self) -> Result<Schema, DescriptorError> {
        let specs = self.parameter_specs()?;
        Ok(Schema::builder()
            .fields(specs.iter().map(ParameterSpec::to_field))
            .build()?)
    }
}
