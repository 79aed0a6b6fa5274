//! Error types for the servo controller.

use crate::transport::TransportError;

/// Errors returned by [`Controller`](crate::Controller) operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A requested angle was outside 0-180.
    #[error("Angle {0} must be between 0 and 180 degrees")]
    InvalidAngle(i64),

    /// The offset entry contained something other than a signed decimal.
    #[error("Invalid offset input: {0:?}")]
    InvalidOffsetInput(String),

    /// An accelerometer line could not be parsed.
    #[error("Invalid sensor sample: {0:?}")]
    InvalidSample(String),

    /// Manual sends are only accepted in manual mode.
    #[error("Manual send rejected while automatic mode is active")]
    AutomaticModeActive,

    /// The actuator request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
