// Typed errors with thiserror. Surface meaningful messages to JS.
// Degenerate geometry and stale listeners are not errors; they resolve to
// neutral output or a silent no-op inside the engine.

use thiserror::Error;

use crate::types::BindingId;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Coefficient '{name}' out of range: {value} (expected {expected})")]
    CoefficientOutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Unknown binding {0}")]
    UnknownBinding(BindingId),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
