//! Rate- and magnitude-gated dispatch of servo commands.
//!
//! The gate decides whether a smoothed camera angle is worth sending, maps it into servo units,
//! and hands a one-way command to a [`ServoSender`]. It never waits for the hardware.

use crate::{range_map::RangeMapper, Result};
use log::{debug, error, info};
use std::fmt;
use std::time::{Duration, Instant};

/// One command for the servo rig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoCommand {
    /// Servo channel on the driver board
    pub channel: u8,
    /// Target angle in servo units
    pub angle: i32,
    /// Serial port override; `None` lets the sender pick its default
    pub port: Option<String>,
}

impl fmt::Display for ServoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.channel, self.angle)
    }
}

/// Something that forwards servo commands to the hardware.
///
/// Implementations must return as soon as the command is handed off. An `Err` means the
/// command never left (the sender could not be launched or reached).
pub trait ServoSender {
    fn send(&mut self, command: &ServoCommand) -> Result<()>;
}

impl<S: ServoSender + ?Sized> ServoSender for Box<S> {
    fn send(&mut self, command: &ServoCommand) -> Result<()> {
        (**self).send(command)
    }
}

/// Gate tuning
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Minimum time between two sends
    pub send_interval: Duration,
    /// Minimum change in camera degrees between two sends
    pub send_delta: f64,
    /// Camera angle to servo unit mapping
    pub mapper: RangeMapper,
    /// Channel the commands address
    pub channel: u8,
    /// Serial port handed to the sender
    pub port: Option<String>,
}

/// What a dispatch attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command handed to the sender
    Sent(ServoCommand),
    /// Too soon after the last send
    SkippedInterval,
    /// Angle moved less than the threshold since the last send
    SkippedDelta,
    /// The sender refused the command; state unchanged
    Failed,
}

impl DispatchOutcome {
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Debounces outgoing commands by time and by magnitude
#[derive(Debug, Clone)]
pub struct DispatchGate {
    config: GateConfig,
    last_sent_time: Option<Instant>,
    last_sent_angle: Option<f64>,
}

impl DispatchGate {
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self {
            config,
            last_sent_time: None,
            last_sent_angle: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    /// When the last command went out
    #[must_use]
    pub const fn last_sent_time(&self) -> Option<Instant> {
        self.last_sent_time
    }

    /// Camera angle of the last command that went out
    #[must_use]
    pub const fn last_sent_angle(&self) -> Option<f64> {
        self.last_sent_angle
    }

    /// Offer a camera angle for dispatch at time `now`.
    ///
    /// State advances only when the sender accepts the command. A failing sender is logged and
    /// the next qualifying call simply tries again.
    pub fn try_dispatch<S: ServoSender + ?Sized>(
        &mut self,
        angle: f64,
        now: Instant,
        sender: &mut S,
    ) -> DispatchOutcome {
        if let Some(last_time) = self.last_sent_time {
            if now.saturating_duration_since(last_time) < self.config.send_interval {
                return DispatchOutcome::SkippedInterval;
            }
        }

        if let Some(last_angle) = self.last_sent_angle {
            if (angle - last_angle).abs() < self.config.send_delta {
                debug!("Angle {:.2} within {} of last send, skipping", angle, self.config.send_delta);
                return DispatchOutcome::SkippedDelta;
            }
        }

        let servo_value = match self.config.mapper.map_to_servo(angle) {
            Ok(value) => value,
            Err(e) => {
                error!("Cannot map camera angle {}: {}", angle, e);
                return DispatchOutcome::Failed;
            }
        };

        let command = ServoCommand {
            channel: self.config.channel,
            angle: servo_value,
            port: self.config.port.clone(),
        };

        match sender.send(&command) {
            Ok(()) => {
                self.last_sent_time = Some(now);
                self.last_sent_angle = Some(angle);
                info!("Sent {} (servo) from camera angle {:.2}", servo_value, angle);
                DispatchOutcome::Sent(command)
            }
            Err(e) => {
                error!("Failed to dispatch servo command: {}", e);
                DispatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Default)]
    struct RecordingSender {
        sent: Vec<ServoCommand>,
        fail: bool,
    }

    impl ServoSender for RecordingSender {
        fn send(&mut self, command: &ServoCommand) -> Result<()> {
            if self.fail {
                return Err(Error::DispatchError("sender unavailable".to_string()));
            }
            self.sent.push(command.clone());
            Ok(())
        }
    }

    fn gate() -> DispatchGate {
        DispatchGate::new(GateConfig {
            send_interval: Duration::from_millis(200),
            send_delta: 2.0,
            mapper: RangeMapper::default(),
            channel: 3,
            port: Some("/dev/ttyUSB0".to_string()),
        })
    }

    #[test]
    fn test_first_dispatch_goes_through() {
        let mut gate = gate();
        let mut sender = RecordingSender::default();
        let now = Instant::now();

        let outcome = gate.try_dispatch(0.0, now, &mut sender);
        assert!(outcome.is_sent());
        assert_eq!(
            sender.sent,
            vec![ServoCommand {
                channel: 3,
                angle: 135,
                port: Some("/dev/ttyUSB0".to_string()),
            }]
        );
        assert_eq!(gate.last_sent_time(), Some(now));
        assert_eq!(gate.last_sent_angle(), Some(0.0));
    }

    #[test]
    fn test_interval_blocks_regardless_of_delta() {
        let mut gate = gate();
        let mut sender = RecordingSender::default();
        let start = Instant::now();

        gate.try_dispatch(0.0, start, &mut sender);
        let outcome = gate.try_dispatch(80.0, start + Duration::from_millis(199), &mut sender);
        assert_eq!(outcome, DispatchOutcome::SkippedInterval);
        assert_eq!(sender.sent.len(), 1);
    }

    #[test]
    fn test_small_delta_blocks() {
        let mut gate = gate();
        let mut sender = RecordingSender::default();
        let start = Instant::now();

        gate.try_dispatch(10.0, start, &mut sender);
        let outcome = gate.try_dispatch(11.9, start + Duration::from_secs(1), &mut sender);
        assert_eq!(outcome, DispatchOutcome::SkippedDelta);
        assert_eq!(gate.last_sent_angle(), Some(10.0));
        assert_eq!(gate.last_sent_time(), Some(start));
    }

    #[test]
    fn test_delta_at_threshold_sends() {
        let mut gate = gate();
        let mut sender = RecordingSender::default();
        let start = Instant::now();

        gate.try_dispatch(10.0, start, &mut sender);
        let outcome = gate.try_dispatch(12.0, start + Duration::from_millis(200), &mut sender);
        assert!(outcome.is_sent());
        assert_eq!(sender.sent[1].angle, 153);
    }

    #[test]
    fn test_failure_does_not_advance_state() {
        let mut gate = gate();
        let mut sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let start = Instant::now();

        assert_eq!(gate.try_dispatch(10.0, start, &mut sender), DispatchOutcome::Failed);
        assert_eq!(gate.last_sent_time(), None);
        assert_eq!(gate.last_sent_angle(), None);

        // Next frame retries immediately once the sender recovers
        sender.fail = false;
        let outcome = gate.try_dispatch(10.0, start + Duration::from_millis(1), &mut sender);
        assert!(outcome.is_sent());
    }

    #[test]
    fn test_command_display() {
        let command = ServoCommand {
            channel: 0,
            angle: 270,
            port: None,
        };
        assert_eq!(command.to_string(), "0 270");
    }
}
