//! Error types for memory providers.

use crate::provider::Capability;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced by providers and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider '{provider}' could not connect after {attempts} attempts")]
    ConnectionExhausted { provider: String, attempts: u32 },

    #[error("provider '{provider}' is not connected")]
    NotConnected { provider: String },

    #[error("provider '{provider}' does not support {capability}")]
    CapabilityNotSupported {
        provider: String,
        capability: Capability,
    },

    #[error("provider '{name}' is not configured")]
    UnknownProvider { name: String },

    #[error("provider '{provider}' backend error: {message}")]
    Backend {
        provider: String,
        message: String,
        retryable: bool,
    },
}

impl ProviderError {
    pub fn not_connected(provider: impl Into<String>) -> Self {
        Self::NotConnected {
            provider: provider.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, capability: Capability) -> Self {
        Self::CapabilityNotSupported {
            provider: provider.into(),
            capability,
        }
    }

    pub fn backend(provider: impl Into<String>, error: BackendError) -> Self {
        let retryable = error.is_retryable();
        Self::Backend {
            provider: provider.into(),
            message: error.to_string(),
            retryable,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionExhausted { .. } => "CONNECTION_EXHAUSTED",
            Self::NotConnected { .. } => "NOT_CONNECTED",
            Self::CapabilityNotSupported { .. } => "CAPABILITY_NOT_SUPPORTED",
            Self::UnknownProvider { .. } => "UNKNOWN_PROVIDER",
            Self::Backend { .. } => "PROVIDER_BACKEND_ERROR",
        }
    }

    /// Whether a later attempt could succeed without configuration changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionExhausted { .. } | Self::NotConnected { .. } => true,
            Self::Backend { retryable, .. } => *retryable,
            Self::CapabilityNotSupported { .. } | Self::UnknownProvider { .. } => false,
        }
    }
}

/// Failure reported by a storage backend.
///
/// The distinction drives the connect loop: retryable failures are attempted
/// again after a backoff, fatal ones stop immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{0}")]
    Retryable(String),

    #[error("{0}")]
    Fatal(String),
}

impl BackendError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ProviderError::not_connected("cloud").error_code(),
            "NOT_CONNECTED"
        );
        assert_eq!(
            ProviderError::unsupported("cloud", Capability::Search).to_string(),
            "provider 'cloud' does not support search"
        );
    }

    #[test]
    fn test_backend_error_keeps_retryability() {
        let transient = ProviderError::backend("cloud", BackendError::retryable("timed out"));
        let fatal = ProviderError::backend("cloud", BackendError::fatal("auth failed"));

        assert!(transient.is_retryable());
        assert!(!fatal.is_retryable());
        assert_eq!(
            fatal.to_string(),
            "provider 'cloud' backend error: auth failed"
        );
    }
}
