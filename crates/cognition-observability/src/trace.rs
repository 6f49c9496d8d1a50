//! Subscriber installation.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{ObservabilityConfig, ObservabilityError};

/// Build the filter from `RUST_LOG`, falling back to `default_filter`.
fn env_filter(default_filter: &str) -> Result<EnvFilter, ObservabilityError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
            ObservabilityError::Config(format!("invalid filter '{default_filter}': {e}"))
        }),
    }
}

/// Initialize tracing subsystem
///
/// Fails with `TracingInit` if a global subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = env_filter(&config.default_filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };
    installed.map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service,
        json = config.json,
        "Initialized structured tracing"
    );
    Ok(())
}
