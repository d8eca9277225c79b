//! Error types for GEOARB

use thiserror::Error;

use crate::SourceId;

/// Core GEOARB errors
///
/// None of the sensor-side variants are fatal to a running stream: they are
/// logged where they occur and the affected source is treated as absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoArbError {
    // Collaborator errors
    #[error("Location source {sensor} unavailable: {reason}")]
    SubscriptionUnavailable { sensor: SourceId, reason: String },

    #[error("Last known location query for {sensor} failed: {reason}")]
    QueryFailure { sensor: SourceId, reason: String },

    // Stream errors
    #[error("Arbitration stream closed")]
    StreamClosed,

    // Ambient errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),
}

/// Result type for GEOARB operations
pub type GeoArbResult<T> = Result<T, GeoArbError>;
