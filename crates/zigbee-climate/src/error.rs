//! Error types for the climate entity layer

use thiserror::Error;

/// Errors raised while building or hosting climate entities.
///
/// Device writes never surface here; they report a plain `bool`.
#[derive(Error, Debug)]
pub enum ClimateError {
    /// No entity with this ID
    #[error("Climate entity not found: {0}")]
    EntityNotFound(String),

    /// Device has no Thermostat server cluster
    #[error("Device is not a thermostat: {0}")]
    NotAThermostat(String),

    /// IO error (persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
