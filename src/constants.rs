// Actuator endpoint (the board runs its own access point)
pub const DEFAULT_HOST: &str = "192.168.4.1";
pub const SET_SERVO_PATH: &str = "/setServo";
pub const GET_SERVO_PATH: &str = "/getServo";
pub const ANGLE_RESPONSE_PREFIX: &str = "Current Servo Angle:";

// Request timeouts (milliseconds)
pub const SEND_TIMEOUT_MS: u64 = 750;
pub const READ_TIMEOUT_MS: u64 = 250;

// Loop cadence (milliseconds)
pub const DISPATCH_INTERVAL_MS: u64 = 500;
pub const MONITOR_INTERVAL_MS: u64 = 500;

// Servo movement constants
pub const MIN_ANGLE: f32 = 0.0;
pub const MAX_ANGLE: f32 = 180.0;
pub const NEUTRAL_ANGLE: f32 = 90.0;

// Tilt readout: degrees of tilt per strength step, and the step range
pub const DEGREES_PER_STRENGTH_STEP: f32 = 9.0;
pub const MIN_STRENGTH: f32 = 1.0;
pub const MAX_STRENGTH: f32 = 10.0;
