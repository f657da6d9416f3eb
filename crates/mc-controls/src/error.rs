//! Error types for control system operations.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while setting up the control core.
///
/// Nothing on the per-tick path returns these; runtime faults are modeled as
/// supervisor state instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Core(#[from] mc_core::CoreError),

    /// The actuator hardware rejected its configuration.
    #[error("Actuator hardware error: {0}")]
    Hardware(#[from] mc_hal::HalError),
}
