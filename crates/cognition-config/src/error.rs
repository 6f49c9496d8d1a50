//! Error types for the configuration store.

use cognition_core::Violation;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading, reading or watching configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration '{name}' not found")]
    NotFound { name: String },

    #[error("configuration directory not found: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration '{name}': {}", format_violations(violations))]
    Validation {
        name: String,
        violations: Vec<Violation>,
    },

    #[error("credential {variable} is not set")]
    MissingCredential { variable: &'static str },

    #[error("setting '{key}' is required in '{document}'")]
    MissingSetting { document: String, key: String },

    #[error("invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("file watcher error: {0}")]
    Watch(String),
}

impl ConfigError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn missing_setting(document: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingSetting {
            document: document.into(),
            key: key.into(),
        }
    }

    /// Stable identifier for programmatic branching.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "CONFIG_NOT_FOUND",
            Self::DirectoryMissing { .. } => "CONFIG_DIRECTORY_MISSING",
            Self::Parse { .. } => "CONFIG_PARSE_ERROR",
            Self::Validation { .. } => "CONFIG_VALIDATION_ERROR",
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::MissingSetting { .. } => "MISSING_SETTING",
            Self::InvalidEnvVar { .. } => "INVALID_ENV_VAR",
            Self::Watch(_) => "CONFIG_WATCH_ERROR",
        }
    }

    /// A parse failure may clear up once the editor finishes writing the file.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Watch(_))
    }
}

impl From<notify::Error> for ConfigError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
