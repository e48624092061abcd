use crate::{
    constants::{DEMO_FINAL_ANGLE, DEMO_RAMP_ANGLE, DEMO_SPEED_DEG_PER_SEC},
    utils::safe_cast::f64_to_i32,
    Error, Result,
};
use std::fmt;

/// A single line understood by the servo sketch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCommand {
    /// `c <ch>`: make a channel current
    SelectChannel(u8),
    /// `s <deg/s>`: movement speed for the current channel
    SetSpeed(i32),
    /// `a <angle>`: move the current channel
    MoveCurrent(i32),
    /// `<ch> <angle>`: move a specific channel
    Move { channel: u8, angle: i32 },
}

impl fmt::Display for SerialCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectChannel(channel) => write!(f, "c {channel}"),
            Self::SetSpeed(speed) => write!(f, "s {speed}"),
            Self::MoveCurrent(angle) => write!(f, "a {angle}"),
            Self::Move { channel, angle } => write!(f, "{channel} {angle}"),
        }
    }
}

/// One step of a scripted sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Send(SerialCommand),
    /// Pause for the given number of milliseconds
    Wait(u64),
}

/// The sequence run when the sender is started without any command
#[must_use]
pub fn demo_sequence(pause_ms: u64) -> Vec<Step> {
    vec![
        Step::Send(SerialCommand::SelectChannel(0)),
        Step::Send(SerialCommand::SetSpeed(DEMO_SPEED_DEG_PER_SEC)),
        Step::Send(SerialCommand::MoveCurrent(DEMO_RAMP_ANGLE)),
        Step::Wait(pause_ms),
        Step::Send(SerialCommand::Move {
            channel: 0,
            angle: DEMO_FINAL_ANGLE,
        }),
    ]
}

/// Turn CLI options into commands.
///
/// Channel and angle together become a single `<ch> <angle>`. Otherwise each given option is
/// sent on its own, channel first, then speed, then angle. Fractional values are truncated.
/// Returns `None` when no option was given.
///
/// # Errors
///
/// Returns an error for non-finite or out-of-range angle and speed values
pub fn plan_commands(
    channel: Option<u8>,
    angle: Option<f64>,
    speed: Option<f64>,
) -> Result<Option<Vec<SerialCommand>>> {
    if channel.is_none() && angle.is_none() && speed.is_none() {
        return Ok(None);
    }

    if let (Some(channel), Some(angle)) = (channel, angle) {
        return Ok(Some(vec![SerialCommand::Move {
            channel,
            angle: f64_to_i32(angle)?,
        }]));
    }

    let mut commands = Vec::new();
    if let Some(channel) = channel {
        commands.push(SerialCommand::SelectChannel(channel));
    }
    if let Some(speed) = speed {
        commands.push(SerialCommand::SetSpeed(f64_to_i32(speed)?));
    }
    if let Some(angle) = angle {
        commands.push(SerialCommand::MoveCurrent(f64_to_i32(angle)?));
    }
    Ok(Some(commands))
}

/// Parse one line read in serve mode.
///
/// `<angle>` moves `default_channel`; `<ch> <angle>` moves the named channel.
///
/// # Errors
///
/// Returns a protocol error for empty, malformed, or out-of-range lines
pub fn parse_serve_line(line: &str, default_channel: u8) -> Result<SerialCommand> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    let parse_angle = |text: &str| -> Result<i32> {
        let value: f64 = text
            .parse()
            .map_err(|_| Error::ProtocolError(format!("invalid angle '{text}'")))?;
        f64_to_i32(value).map_err(|e| Error::ProtocolError(e.to_string()))
    };

    match fields.as_slice() {
        [angle] => Ok(SerialCommand::Move {
            channel: default_channel,
            angle: parse_angle(angle)?,
        }),
        [channel, angle] => {
            let channel: u8 = channel
                .parse()
                .map_err(|_| Error::ProtocolError(format!("invalid channel '{channel}'")))?;
            Ok(SerialCommand::Move {
                channel,
                angle: parse_angle(angle)?,
            })
        }
        [] => Err(Error::ProtocolError("empty line".to_string())),
        _ => Err(Error::ProtocolError(format!("unexpected line '{}'", line.trim()))),
    }
}
