//! Error types for the tool registry.

use cognition_core::{SchemaError, Violation};
use thiserror::Error;

/// Result type for tool registry operations
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors surfaced by [`ToolRegistry`](crate::ToolRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("tool catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    #[error("tool '{name}' is not registered")]
    NotFound { name: String },

    #[error("invalid arguments for tool '{tool}': {}", join_violations(.violations))]
    InvalidArguments {
        tool: String,
        violations: Vec<Violation>,
    },

    #[error("tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    #[error("tool registry is closed")]
    RegistryClosed,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ToolError {
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CatalogUnavailable { .. } => "TOOL_CATALOG_UNAVAILABLE",
            Self::NotFound { .. } => "TOOL_NOT_FOUND",
            Self::InvalidArguments { .. } => "INVALID_TOOL_ARGUMENTS",
            Self::ExecutionFailed { .. } => "TOOL_EXECUTION_FAILED",
            Self::RegistryClosed => "TOOL_REGISTRY_CLOSED",
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// The registry itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CatalogUnavailable { .. } | Self::ExecutionFailed { .. }
        )
    }
}

/// Transport failures of [`CatalogClient`](crate::CatalogClient).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("url '{url}' cannot be a base")]
    NotABase { url: String },

    #[error("failed to create HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("undecodable response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    /// Only an HTTP status is reported by the remote side; everything else
    /// happened before or while reading the response.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why a catalog descriptor could not be turned into a tool.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("parameter '{name}' has an unrecognized declaration")]
    MalformedParameter { name: String },

    #[error("parameter '{name}' has unknown type '{type_name}'")]
    UnknownType { name: String, type_name: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
