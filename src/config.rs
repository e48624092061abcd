//! Configuration management for the hand-servo tools

use crate::{
    constants::{
        DEFAULT_BAUD, DEFAULT_CHANNEL, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_IN_MAX, DEFAULT_IN_MIN,
        DEFAULT_MAX_HANDS, DEFAULT_OUT_MAX, DEFAULT_OUT_MIN, DEFAULT_RESPONSE_WAIT_MS, DEFAULT_SEND_DELTA_DEG,
        DEFAULT_SEND_INTERVAL_SECS, DEFAULT_SERIAL_TIMEOUT_MS, DEFAULT_SETTLE_MS, DEFAULT_SMOOTHING_ALPHA,
        SERVO_CHANNEL_COUNT,
    },
    dispatch::GateConfig,
    filters::{create_filter, exponential::ExponentialFilter, validate_alpha, AngleFilter, NoFilter},
    hand_angle::ReferenceVector,
    range_map::RangeMapper,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Angle smoothing
    pub smoothing: SmoothingConfig,

    /// Camera angle to servo range mapping
    pub mapping: MappingConfig,

    /// Command dispatch gating and transport
    pub dispatch: DispatchConfig,

    /// Serial link to the servo board
    pub serial: SerialConfig,

    /// Hand tracking input
    pub tracker: TrackerConfig,
}

/// Smoothing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type (`exponential` or `none`)
    pub filter: String,

    /// Exponential smoothing factor, 0..1 (lower = smoother)
    pub alpha: f64,

    /// Feed every hand into one smoother and one dispatch gate instead of one per hand
    pub shared_state: bool,
}

/// Range mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Lower bound of the expected camera angle (degrees)
    pub in_min: f64,

    /// Upper bound of the expected camera angle (degrees)
    pub in_max: f64,

    /// Servo value for `in_min`
    pub out_min: f64,

    /// Servo value for `in_max`
    pub out_max: f64,
}

/// How commands reach the serial sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderMode {
    /// One short-lived `send` process per command
    #[default]
    Spawn,
    /// One long-lived `send --serve` process fed through its stdin
    Pipe,
}

/// Dispatch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Send commands at all
    pub enabled: bool,

    /// Minimum seconds between sends
    pub send_interval_secs: f64,

    /// Minimum change in camera degrees to trigger a send
    pub send_delta_deg: f64,

    /// Servo channel per hand index; hands past the end use the first entry
    pub channels: Vec<u8>,

    /// Serial port passed to the sender; `None` lets it pick the platform default
    pub port: Option<String>,

    /// Transport to the sender
    pub mode: SenderMode,

    /// Program providing the `send` subcommand; defaults to this executable
    pub sender_program: Option<PathBuf>,
}

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port; `None` means the platform default
    pub port: Option<String>,

    /// Baud rate
    pub baud: u32,

    /// Delay after opening while the board resets (ms)
    pub settle_ms: u64,

    /// Delay after each command before reading responses (ms)
    pub response_wait_ms: u64,

    /// Read timeout (ms)
    pub timeout_ms: u64,
}

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum number of hands processed per frame
    pub max_hands: usize,

    /// Frame width used when a frame does not report its own
    pub frame_width: u32,

    /// Frame height used when a frame does not report its own
    pub frame_height: u32,

    /// Landmark pair the rotation is measured along
    pub reference: ReferenceVector,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "exponential".to_string(),
            alpha: DEFAULT_SMOOTHING_ALPHA,
            shared_state: false,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            in_min: DEFAULT_IN_MIN,
            in_max: DEFAULT_IN_MAX,
            out_min: DEFAULT_OUT_MIN,
            out_max: DEFAULT_OUT_MAX,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            send_interval_secs: DEFAULT_SEND_INTERVAL_SECS,
            send_delta_deg: DEFAULT_SEND_DELTA_DEG,
            channels: vec![DEFAULT_CHANNEL],
            port: None,
            mode: SenderMode::default(),
            sender_program: None,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD,
            settle_ms: DEFAULT_SETTLE_MS,
            response_wait_ms: DEFAULT_RESPONSE_WAIT_MS,
            timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_hands: DEFAULT_MAX_HANDS,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            reference: ReferenceVector::default(),
        }
    }
}

impl MappingConfig {
    #[must_use]
    pub const fn mapper(&self) -> RangeMapper {
        RangeMapper::new(self.in_min, self.in_max, self.out_min, self.out_max)
    }
}

impl DispatchConfig {
    /// Channel for a hand index
    #[must_use]
    pub fn channel_for_hand(&self, hand_index: usize) -> u8 {
        self.channels
            .get(hand_index)
            .or_else(|| self.channels.first())
            .copied()
            .unwrap_or(DEFAULT_CHANNEL)
    }

    #[must_use]
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs_f64(self.send_interval_secs.max(0.0))
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the smoothing filter for one hand
    pub fn create_filter(&self) -> Result<Box<dyn AngleFilter>> {
        match self.smoothing.filter.to_lowercase().as_str() {
            "exponential" | "ema" => {
                validate_alpha(self.smoothing.alpha)?;
                Ok(Box::new(ExponentialFilter::new(self.smoothing.alpha)))
            }
            "none" => Ok(Box::new(NoFilter::default())),
            name => create_filter(name),
        }
    }

    /// Dispatch gate settings for one hand
    #[must_use]
    pub fn gate_config(&self, hand_index: usize) -> GateConfig {
        GateConfig {
            send_interval: self.dispatch.send_interval(),
            send_delta: self.dispatch.send_delta_deg,
            mapper: self.mapping.mapper(),
            channel: self.dispatch.channel_for_hand(hand_index),
            port: self.dispatch.port.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Smoothing
        self.create_filter()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        // Mapping bounds; equal input bounds would divide by zero
        let m = &self.mapping;
        if !(m.in_min.is_finite() && m.in_max.is_finite() && m.out_min.is_finite() && m.out_max.is_finite()) {
            return Err(Error::ConfigError("Mapping bounds must be finite".to_string()));
        }
        if m.in_min >= m.in_max {
            return Err(Error::ConfigError(format!(
                "Mapping in_min ({}) must be below in_max ({})",
                m.in_min, m.in_max
            )));
        }
        if m.out_min == m.out_max {
            return Err(Error::ConfigError("Mapping out_min and out_max must differ".to_string()));
        }

        // Dispatch gating
        if !(self.dispatch.send_interval_secs.is_finite() && self.dispatch.send_interval_secs >= 0.0) {
            return Err(Error::ConfigError("Send interval must be a non-negative number".to_string()));
        }
        if !(self.dispatch.send_delta_deg.is_finite() && self.dispatch.send_delta_deg >= 0.0) {
            return Err(Error::ConfigError("Send delta must be a non-negative number".to_string()));
        }
        if self.dispatch.channels.is_empty() {
            return Err(Error::ConfigError("At least one servo channel is required".to_string()));
        }
        if let Some(channel) = self.dispatch.channels.iter().find(|c| **c >= SERVO_CHANNEL_COUNT) {
            return Err(Error::ConfigError(format!(
                "Channel {channel} out of range 0..{}",
                SERVO_CHANNEL_COUNT - 1
            )));
        }

        // Serial
        if self.serial.baud == 0 {
            return Err(Error::ConfigError("Baud rate must be greater than 0".to_string()));
        }

        // Tracker
        if self.tracker.max_hands == 0 {
            return Err(Error::ConfigError("max_hands must be greater than 0".to_string()));
        }
        if self.tracker.frame_width == 0 || self.tracker.frame_height == 0 {
            return Err(Error::ConfigError("Frame dimensions must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Hand Servo Configuration

# Angle smoothing
smoothing:
  filter: "exponential"
  alpha: 0.2            # EMA factor, 0..1 (lower = smoother)
  shared_state: false   # true: all hands share one smoother and one dispatch gate

# Camera angle (degrees) to servo units
mapping:
  in_min: -90.0
  in_max: 90.0
  out_min: 0.0
  out_max: 270.0

# Command dispatch
dispatch:
  enabled: true
  send_interval_secs: 0.2
  send_delta_deg: 2.0
  channels: [0]
  port: null
  mode: "spawn"         # spawn | pipe
  sender_program: null

# Serial link
serial:
  port: null            # platform default when unset
  baud: 115200
  settle_ms: 2000
  response_wait_ms: 20
  timeout_ms: 1000

# Hand tracking input
tracker:
  max_hands: 2
  frame_width: 640
  frame_height: 480
  reference: "wrist_middle"   # wrist_middle | index_pinky
"#;
