//! Error types for the mc-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write trace file: {path}")]
    TraceWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Control setup failed: {0}")]
    Control(String),

    #[error("Hardware error: {0}")]
    Hardware(String),

    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<mc_config::ConfigError> for AppError {
    fn from(err: mc_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<mc_config::ValidationError> for AppError {
    fn from(err: mc_config::ValidationError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<mc_controls::ControlError> for AppError {
    fn from(err: mc_controls::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}

impl From<mc_hal::HalError> for AppError {
    fn from(err: mc_hal::HalError) -> Self {
        AppError::Hardware(err.to_string())
    }
}
