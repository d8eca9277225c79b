//! Logging setup
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over
//! the configured filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use geoarb_core::{GeoArbError, GeoArbResult};

use crate::LoggingConfig;

/// Build the filter from RUST_LOG, falling back to `config.filter`
pub fn env_filter(config: &LoggingConfig) -> GeoArbResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| GeoArbError::InvalidConfig(format!("logging.filter: {}", e))),
    }
}

/// Initialize the global subscriber
///
/// Fails with `LoggingInit` if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> GeoArbResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
    };

    result.map_err(|e| GeoArbError::LoggingInit(e.to_string()))
}
