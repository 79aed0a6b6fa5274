use crate::constants::{MAX_ANGLE, MIN_ANGLE, NEUTRAL_ANGLE};
use crate::error::ControllerError;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Display, EnumIter, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

#[derive(Debug, Display, Clone, Copy, Eq, PartialEq)]
pub enum TiltDirection {
    Left,
    Right,
}

/// Servo position in whole degrees, always within 0..=180.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ServoAngle(u8);

impl ServoAngle {
    pub const MIN: ServoAngle = ServoAngle(MIN_ANGLE as u8);
    pub const MAX: ServoAngle = ServoAngle(MAX_ANGLE as u8);
    pub const NEUTRAL: ServoAngle = ServoAngle(NEUTRAL_ANGLE as u8);

    pub fn new(degrees: i64) -> Result<Self, ControllerError> {
        if (MIN_ANGLE as i64..=MAX_ANGLE as i64).contains(&degrees) {
            Ok(ServoAngle(degrees as u8))
        } else {
            Err(ControllerError::InvalidAngle(degrees))
        }
    }

    /// Clamps into range, then truncates toward zero. NaN becomes 0.
    pub fn clamped(degrees: f32) -> Self {
        ServoAngle(clamp_angle(degrees) as u8)
    }

    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ServoAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// One accelerometer reading: the left-right axis and the gravity axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltSample {
    pub x: f32,
    pub z: f32,
}

impl TiltSample {
    pub fn new(x: f32, z: f32) -> Self {
        TiltSample { x, z }
    }
}

impl FromStr for TiltSample {
    type Err = ControllerError;

    /// Accepts `x,y,z` (raw three-axis reading, y unused) or `x,z`,
    /// separated by commas and/or whitespace.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || ControllerError::InvalidSample(line.to_string());
        let values = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [x, _, z] | [x, z] => Ok(TiltSample::new(*x, *z)),
            _ => Err(invalid()),
        }
    }
}

/// Outcome of one transmission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Sent(ServoAngle),
    Failed(String),
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Sent(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DispatchResult::Sent(_) => None,
            DispatchResult::Failed(message) => Some(message),
        }
    }
}

/// Status line plus the error bar. An empty `last_error` means no error is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub last_error: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltReadout {
    pub tilt: f32,
    pub direction: TiltDirection,
    pub strength: u8,
    pub angle_without_offset: ServoAngle,
    pub angle_with_offset: ServoAngle,
}

fn clamp_angle(angle: f32) -> f32 {
    angle.max(MIN_ANGLE).min(MAX_ANGLE)
}
