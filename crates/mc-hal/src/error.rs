//! Error types for hardware operations.

use thiserror::Error;

/// Result type for hardware operations.
pub type HalResult<T> = Result<T, HalError>;

/// Errors raised while setting up a peripheral.
///
/// Register writes themselves cannot fail; only configuration that the
/// hardware cannot realise is reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HalError {
    #[error("Invalid carrier configuration: {what}")]
    InvalidCarrier { what: String },
}
