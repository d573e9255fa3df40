//! Scenario loading error types.

use thiserror::Error;

/// Errors raised while loading a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The file could not be read.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid scenario document.
    #[error("Failed to parse scenario file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for scenario loading.
pub type ScenarioResult<T> = Result<T, ScenarioError>;
