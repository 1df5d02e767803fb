//! Error types for the field engine.

use thiserror::Error;

use crate::record::LevelType;

/// Errors that can occur while resolving, converting, or rendering fields.
///
/// Only `InvalidConfig` is fatal; every other variant is recovered locally
/// with skip-and-continue semantics.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Source unavailable for forecast hour {forecast_hour}: {reason}")]
    SourceUnavailable { forecast_hour: u32, reason: String },

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Requested levels not available for {variable} ({level_type}): {levels:?}")]
    LevelNotFound {
        variable: String,
        level_type: LevelType,
        levels: Vec<u32>,
    },

    #[error("Malformed grid: {0}")]
    MalformedGrid(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to render product: {0}")]
    Render(String),
}

/// Result type for field engine operations.
pub type Result<T> = std::result::Result<T, FieldError>;
