//! Library error type
//!
//! Gameplay faults are recovered locally and reported as events; only
//! configuration I/O surfaces them as `Err`.

use thiserror::Error;

use crate::sim::Color;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The AR coordinator has no world position for a requested color
    #[error("no world target registered for {0}")]
    MissingWorldTarget(Color),

    /// The orbiter did not report arrival within the configured window
    #[error("orbiter did not reach {color} within {waited:.2}s")]
    NavigatorStuck { color: Color, waited: f32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::ConfigParse(err.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err.to_string())
    }
}
