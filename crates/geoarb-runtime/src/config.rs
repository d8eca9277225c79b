//! Runtime configuration
//!
//! Durations are written as human-readable strings ("30s", "2500ms") in the
//! JSON document. Every field is optional and falls back to its default.

use std::time::Duration;

use serde::Deserialize;

use geoarb_core::{GeoArbError, GeoArbResult, RECENCY_WINDOW};

/// Default delay between the last observer leaving and the sensors stopping
pub const DEFAULT_STOP_DELAY: Duration = Duration::from_millis(2500);

/// When a non-empty selection turns into an emission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionPolicy {
    /// Emit after every update with a winner, even if the winner's sample is unchanged
    #[default]
    EveryUpdate,
    /// Emit only when the winning sample differs from the last emitted one
    DistinctSample,
}

/// Arbitration stream configuration
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    /// Age after which a source no longer counts as recent
    pub recency_window: Duration,
    /// Linger time before stopping the sensors once unobserved
    pub stop_delay: Duration,
    pub emission: EmissionPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            recency_window: RECENCY_WINDOW,
            stop_delay: DEFAULT_STOP_DELAY,
            emission: EmissionPolicy::EveryUpdate,
        }
    }
}

impl StreamConfig {
    /// Parse a JSON stream configuration
    pub fn from_json(json: &str) -> GeoArbResult<Self> {
        let raw: RawStreamConfig = serde_json::from_str(json)
            .map_err(|e| GeoArbError::InvalidConfig(e.to_string()))?;
        raw.resolve()
    }

    pub fn validate(&self) -> GeoArbResult<()> {
        if self.recency_window.is_zero() {
            return Err(GeoArbError::InvalidConfig(
                "recency_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directives used when RUST_LOG is not set
    pub filter: String,
    /// Emit JSON lines instead of the pretty format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeConfig {
    pub stream: StreamConfig,
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Parse `{ "stream": {...}, "logging": {...} }`
    pub fn from_json(json: &str) -> GeoArbResult<Self> {
        let raw: RawRuntimeConfig = serde_json::from_str(json)
            .map_err(|e| GeoArbError::InvalidConfig(e.to_string()))?;
        Ok(RuntimeConfig {
            stream: raw.stream.resolve()?,
            logging: raw.logging,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRuntimeConfig {
    stream: RawStreamConfig,
    logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawStreamConfig {
    recency_window: Option<String>,
    stop_delay: Option<String>,
    emission: Option<EmissionPolicy>,
}

impl RawStreamConfig {
    fn resolve(self) -> GeoArbResult<StreamConfig> {
        let defaults = StreamConfig::default();
        let config = StreamConfig {
            recency_window: parse_duration("recency_window", self.recency_window)?
                .unwrap_or(defaults.recency_window),
            stop_delay: parse_duration("stop_delay", self.stop_delay)?
                .unwrap_or(defaults.stop_delay),
            emission: self.emission.unwrap_or(defaults.emission),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_duration(field: &str, value: Option<String>) -> GeoArbResult<Option<Duration>> {
    value
        .map(|text| {
            humantime::parse_duration(&text)
                .map_err(|e| GeoArbError::InvalidConfig(format!("{}: {}", field, e)))
        })
        .transpose()
}
