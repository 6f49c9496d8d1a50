//! # Cognition Core
//!
//! Building blocks shared by every Cognition crate:
//!
//! - [`schema`]: the field-list → validator factory used for configuration
//!   documents and remote tool arguments
//! - [`path`]: dotted-path lookups over JSON value trees
//! - [`validation`]: name rules for memory providers
//! - [`secret`]: a redacting wrapper for credentials

pub mod path;
pub mod schema;
pub mod secret;
pub mod validation;

pub use schema::{FieldSpec, FieldType, Schema, SchemaBuilder, SchemaError, Violation};
pub use secret::{Secret, SecretString};
pub use validation::{NameError, NameRules};
