//! Umbrella error for the runtime context.

use cognition_config::ConfigError;
use cognition_memory::ProviderError;
use cognition_tools::ToolError;
use thiserror::Error;

pub type CognitionResult<T> = Result<T, CognitionError>;

/// Any error surfaced by the Cognition crates.
#[derive(Debug, Error)]
pub enum CognitionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Memory error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[cfg(feature = "tracing")]
    #[error("Observability error: {0}")]
    Observability(#[from] cognition_observability::ObservabilityError),
}

impl CognitionError {
    /// Stable code of the underlying error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
            Self::Tool(e) => e.error_code(),
            #[cfg(feature = "tracing")]
            Self::Observability(_) => "OBSERVABILITY_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_retryable(),
            Self::Provider(e) => e.is_retryable(),
            Self::Tool(e) => e.is_retryable(),
            #[cfg(feature = "tracing")]
            Self::Observability(_) => false,
        }
    }
}
