//! Constants used throughout the application

/// Default exponential smoothing factor (lower = smoother)
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.2;

/// Exponential filter bounds (alpha must lie in the half-open range (MIN, MAX])
pub const SMOOTHING_ALPHA_MIN: f64 = 0.0;
pub const SMOOTHING_ALPHA_MAX: f64 = 1.0;

/// Expected camera-angle domain in degrees
pub const DEFAULT_IN_MIN: f64 = -90.0;
pub const DEFAULT_IN_MAX: f64 = 90.0;

/// Servo range expected by the Arduino sketch
pub const DEFAULT_OUT_MIN: f64 = 0.0;
pub const DEFAULT_OUT_MAX: f64 = 270.0;

/// Minimum seconds between two dispatched commands
pub const DEFAULT_SEND_INTERVAL_SECS: f64 = 0.20;

/// Minimum change in camera degrees before a new command is dispatched
pub const DEFAULT_SEND_DELTA_DEG: f64 = 2.0;

/// Servo channel driven when nothing else is configured
pub const DEFAULT_CHANNEL: u8 = 0;

/// Number of servo channels on the driver board
pub const SERVO_CHANNEL_COUNT: u8 = 16;

/// Serial link defaults
pub const DEFAULT_BAUD: u32 = 115_200;
pub const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 1000;

/// The board resets when the port opens; wait this long before talking to it
pub const DEFAULT_SETTLE_MS: u64 = 2000;

/// Pause after each command before draining responses
pub const DEFAULT_RESPONSE_WAIT_MS: u64 = 20;

/// Demo sequence parameters
pub const DEMO_SPEED_DEG_PER_SEC: i32 = 45;
pub const DEMO_RAMP_ANGLE: i32 = 135;
pub const DEMO_FINAL_ANGLE: i32 = 270;
pub const DEMO_PAUSE_MS: u64 = 1500;

/// Hand tracking defaults
pub const DEFAULT_MAX_HANDS: usize = 2;
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Hand landmark indices (21-point hand model)
pub const WRIST: usize = 0;
pub const INDEX_MCP: usize = 5;
pub const MIDDLE_MCP: usize = 9;
pub const PINKY_MCP: usize = 17;
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Prefix of the tracker's stdout angle protocol
pub const ANGLE_LINE_PREFIX: &str = "ANGLE";

/// Exit status when the serial port cannot be opened
pub const EXIT_SERIAL_UNAVAILABLE: i32 = 2;
