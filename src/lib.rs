mod constants;
mod config;
mod types;
mod error;
mod tilt;
mod transport;
mod controller;
mod dispatch;
mod mock;

pub use config::Config;
pub use controller::Controller;
pub use dispatch::{spawn_dispatch, spawn_monitor, LoopHandle};
pub use error::ControllerError;
pub use mock::MockActuator;
pub use tilt::{tilt_degrees, AngleEstimator, TiltCell};
pub use transport::{parse_angle_response, Actuator, HttpActuator, TransportError};
pub use types::{DispatchResult, Feedback, Mode, ServoAngle, TiltDirection, TiltReadout, TiltSample};

// Re-export commonly used items
pub use constants::{DEFAULT_HOST, MAX_ANGLE, MIN_ANGLE, NEUTRAL_ANGLE};
