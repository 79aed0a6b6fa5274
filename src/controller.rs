use crate::{
    constants::*,
    error::ControllerError,
    tilt::TiltCell,
    transport::Actuator,
    types::{DispatchResult, Feedback, Mode, ServoAngle, TiltDirection, TiltReadout},
};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

const SEND_FAILED: &str = "Error: Could not send servo angle";
const READ_FAILED: &str = "Error: Could not get current servo angle";

#[derive(Debug, Clone)]
struct ControlState {
    mode: Mode,
    offset_entry: String,
    offset: f32,
    offset_confirmed: bool,
    target: ServoAngle,
    current_angle: Option<ServoAngle>,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState {
            mode: Mode::Manual,
            offset_entry: "0".to_string(),
            offset: 0.0,
            offset_confirmed: false,
            target: ServoAngle::NEUTRAL,
            current_angle: None,
        }
    }
}

/// The controller behind the servo screen: mode switch, offset entry,
/// manual send, and the per-tick automatic dispatch.
pub struct Controller {
    actuator: Arc<dyn Actuator>,
    tilt: Arc<TiltCell>,
    state: Mutex<ControlState>,
    feedback: watch::Sender<Feedback>,
}

impl Controller {
    pub fn new(actuator: Arc<dyn Actuator>, tilt: Arc<TiltCell>) -> Self {
        let (feedback, _) = watch::channel(Feedback::default());
        Controller {
            actuator,
            tilt,
            state: Mutex::new(ControlState::default()),
            feedback,
        }
    }

    /// Servo angle for a tilt and offset: `90 - tilt + offset`, clamped to 0-180.
    pub fn target_angle(tilt: f32, offset: f32) -> ServoAngle {
        ServoAngle::clamped(NEUTRAL_ANGLE - tilt + offset)
    }

    pub fn mode(&self) -> Mode {
        self.state.lock().mode
    }

    /// Switching into automatic mode drops any earlier offset confirmation.
    pub fn set_mode(&self, mode: Mode) {
        let mut state = self.state.lock();
        if state.mode == mode {
            return;
        }
        if mode == Mode::Automatic {
            state.offset_confirmed = false;
        }
        state.mode = mode;
        info!("mode switched to {}", mode);
    }

    /// Replaces the offset text. Only digits, `.` and a leading `-` are accepted;
    /// anything else leaves the entry untouched.
    pub fn edit_offset(&self, entry: &str) -> Result<(), ControllerError> {
        let digits = entry.strip_prefix('-').unwrap_or(entry);
        if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(ControllerError::InvalidOffsetInput(entry.to_string()));
        }

        let mut state = self.state.lock();
        state.offset_entry = entry.to_string();
        state.offset_confirmed = false;
        Ok(())
    }

    /// Accepts the current entry as the offset. Unparsable text counts as 0.
    pub fn confirm_offset(&self) -> f32 {
        let mut state = self.state.lock();
        state.offset = state.offset_entry.parse::<f32>().unwrap_or(0.0);
        state.offset_confirmed = true;
        info!("offset confirmed: {}", state.offset);
        state.offset
    }

    pub fn offset(&self) -> f32 {
        self.state.lock().offset
    }

    pub fn offset_entry(&self) -> String {
        self.state.lock().offset_entry.clone()
    }

    pub fn is_offset_confirmed(&self) -> bool {
        self.state.lock().offset_confirmed
    }

    /// Last angle sent or selected.
    pub fn target(&self) -> ServoAngle {
        self.state.lock().target
    }

    /// Last angle reported by the actuator.
    pub fn current_angle(&self) -> Option<ServoAngle> {
        self.state.lock().current_angle
    }

    pub fn readout(&self) -> TiltReadout {
        let tilt = self.tilt.load();
        let offset = self.offset();
        let direction = if tilt > 0.0 {
            TiltDirection::Left
        } else {
            TiltDirection::Right
        };
        let strength = (tilt.abs() / DEGREES_PER_STRENGTH_STEP).clamp(MIN_STRENGTH, MAX_STRENGTH) as u8;

        TiltReadout {
            tilt,
            direction,
            strength,
            angle_without_offset: ServoAngle::clamped(NEUTRAL_ANGLE - tilt),
            angle_with_offset: Self::target_angle(tilt, offset),
        }
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Feedback> {
        self.feedback.subscribe()
    }

    /// One-shot send of a user-chosen angle. Rejected in automatic mode.
    pub async fn send_manual(&self, angle: ServoAngle) -> Result<DispatchResult, ControllerError> {
        {
            let mut state = self.state.lock();
            if state.mode == Mode::Automatic {
                return Err(ControllerError::AutomaticModeActive);
            }
            state.target = angle;
        }

        let result = match self.actuator.send(angle).await {
            Ok(()) => {
                self.feedback.send_modify(|feedback| {
                    feedback.message = format!("Servo angle sent: {}", angle);
                    feedback.last_error.clear();
                });
                DispatchResult::Sent(angle)
            }
            Err(e) => self.record_failure(SEND_FAILED, e.to_string()),
        };
        Ok(result)
    }

    /// One automatic step. `None` when the tick was skipped because automatic
    /// mode is off or the offset is unconfirmed.
    pub async fn dispatch_tick(&self) -> Option<DispatchResult> {
        let angle = {
            let mut state = self.state.lock();
            if state.mode != Mode::Automatic || !state.offset_confirmed {
                return None;
            }
            let angle = Self::target_angle(self.tilt.load(), state.offset);
            state.target = angle;
            angle
        };

        let result = match self.actuator.send(angle).await {
            Ok(()) => {
                debug!("dispatched {}", angle);
                self.feedback.send_modify(|feedback| {
                    feedback.message = format!("Servo angle (sensor): {}", angle);
                });
                DispatchResult::Sent(angle)
            }
            Err(e) => self.record_failure(SEND_FAILED, e.to_string()),
        };
        Some(result)
    }

    /// Asks the actuator where the servo is and shows it.
    pub async fn refresh_current_angle(&self) -> Result<ServoAngle, ControllerError> {
        match self.actuator.read().await {
            Ok(angle) => {
                self.state.lock().current_angle = Some(angle);
                self.feedback.send_modify(|feedback| {
                    feedback.message = format!("Current Servo angle: {}", angle);
                });
                Ok(angle)
            }
            Err(e) => {
                self.record_failure(READ_FAILED, e.to_string());
                Err(e.into())
            }
        }
    }

    fn record_failure(&self, status: &str, message: String) -> DispatchResult {
        self.feedback.send_modify(|feedback| {
            feedback.message = status.to_string();
            feedback.last_error = message.clone();
        });
        DispatchResult::Failed(message)
    }
}
