//! Cognition Observability
//!
//! Installs the process-wide `tracing` subscriber. Every other crate only
//! emits events through the `tracing` macros; this crate decides where they
//! go and in which format.

#[cfg(feature = "tracing")]
pub mod trace;

#[cfg(feature = "tracing")]
pub use trace::init_tracing;

use cognition_config::env::get_env_bool;

/// Environment variable selecting JSON output (`true`/`false`)
pub const LOG_JSON_VAR: &str = "COGNITION_LOG_JSON";

/// Filter directive used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Install a subscriber at all
    pub tracing_enabled: bool,
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
    /// Fallback filter when `RUST_LOG` is not set
    pub default_filter: String,
    /// Reported as the `service` field of the startup event
    pub service: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: true,
            json: false,
            default_filter: DEFAULT_FILTER.to_string(),
            service: "cognition".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Defaults overridden by `COGNITION_LOG_JSON`.
    pub fn from_env() -> Result<Self, ObservabilityError> {
        let mut config = Self::default();
        if let Some(json) =
            get_env_bool(LOG_JSON_VAR).map_err(|e| ObservabilityError::Config(e.to_string()))?
        {
            config.json = json;
        }
        Ok(config)
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// Initialize observability framework
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    #[cfg(feature = "tracing")]
    if config.tracing_enabled {
        trace::init_tracing(config)?;
    }

    #[cfg(not(feature = "tracing"))]
    let _ = config;

    Ok(())
}

/// Observability framework errors
#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
