//! Parsed configuration documents.

use crate::error::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File extensions recognised as configuration documents.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// One configuration file, parsed into a JSON value tree.
///
/// Documents are immutable once built. A reload produces a new document that
/// replaces the old one in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    name: String,
    values: Map<String, Value>,
    loaded_at: DateTime<Utc>,
    source: PathBuf,
}

impl ConfigDocument {
    /// Build a document directly from values, mostly useful in tests.
    pub fn new(name: impl Into<String>, values: Map<String, Value>, source: PathBuf) -> Self {
        Self {
            name: name.into(),
            values,
            loaded_at: Utc::now(),
            source,
        }
    }

    /// Read and parse the document at `path`.
    ///
    /// The root of the file must be a mapping.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let name = document_name(path).ok_or_else(|| {
            ConfigError::parse(path, "not a recognised configuration file name")
        })?;

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::parse(path, e))?;
        let values = parse_mapping(&raw).map_err(|message| ConfigError::parse(path, message))?;

        Ok(Self::new(name, values, path.to_path_buf()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Parse YAML text whose root must be a mapping.
pub fn parse_mapping(raw: &str) -> Result<Map<String, Value>, String> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "document root must be a mapping, found {}",
            cognition_core::schema::kind_of(&other)
        )),
    }
}

/// Document name for `path`, or `None` when the file is not a recognised
/// configuration document.
///
/// Files are recognised by extension alone; the name is the file stem as is.
pub fn document_name(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !RECOGNIZED_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
    {
        return None;
    }
    let stem = path.file_stem()?.to_string_lossy();
    (!stem.is_empty()).then(|| stem.into_owned())
}
