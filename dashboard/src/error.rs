//! Unified error handling for the dashboard.

use crate::config::ConfigError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] tally_engine::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Result type alias for screen actions.
pub type Result<T> = std::result::Result<T, AppError>;
