//! Headless launcher: runs the tracker as a child process and relays its angles.
//!
//! Every line the tracker prints is echoed to the log. In live mode each `ANGLE` line is also
//! pushed through a dispatch gate into a persistent `send --serve` process.

use crate::{
    config::Config,
    constants::ANGLE_LINE_PREFIX,
    dispatch::{DispatchGate, DispatchOutcome, ServoSender},
    sender::{PipeSender, SenderOptions},
    utils::lossy_lines::LossyLines,
    Error, Result,
};
use log::{debug, info, warn};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Parse `ANGLE <hand_index> <degrees>`
///
/// # Errors
///
/// Returns a protocol error for anything that is not a well-formed angle line
pub fn parse_angle_line(line: &str) -> Result<(usize, f64)> {
    let mut fields = line.split_whitespace();

    if fields.next() != Some(ANGLE_LINE_PREFIX) {
        return Err(Error::ProtocolError(format!("not an angle line: '{}'", line.trim())));
    }

    let index = fields
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(|| Error::ProtocolError(format!("missing hand index: '{}'", line.trim())))?;
    let angle = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .filter(|a| a.is_finite())
        .ok_or_else(|| Error::ProtocolError(format!("missing angle: '{}'", line.trim())))?;

    if fields.next().is_some() {
        return Err(Error::ProtocolError(format!("trailing fields: '{}'", line.trim())));
    }
    Ok((index, angle))
}

/// Relays tracker output to a servo sender
pub struct AngleRelay<S: ServoSender> {
    config: Config,
    gates: Vec<DispatchGate>,
    sender: Option<S>,
}

impl<S: ServoSender> AngleRelay<S> {
    /// `sender` of `None` means log-only (not live)
    pub fn new(config: Config, sender: Option<S>) -> Self {
        Self {
            config,
            gates: Vec::new(),
            sender,
        }
    }

    fn gate_mut(&mut self, hand_index: usize) -> &mut DispatchGate {
        let slot = if self.config.smoothing.shared_state { 0 } else { hand_index };
        while self.gates.len() <= slot {
            let index = self.gates.len();
            self.gates.push(DispatchGate::new(self.config.gate_config(index)));
        }
        &mut self.gates[slot]
    }

    /// Handle one line of tracker output
    pub fn handle_line(&mut self, line: &str, now: Instant) -> Option<DispatchOutcome> {
        info!("{}", line.trim_end());

        self.sender.as_ref()?;
        if !line.starts_with(ANGLE_LINE_PREFIX) {
            return None;
        }

        let (hand_index, angle) = match parse_angle_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Ignoring tracker line: {}", e);
                return None;
            }
        };

        let mut sender = self.sender.take()?;
        let outcome = self.gate_mut(hand_index).try_dispatch(angle, now, &mut sender);
        self.sender = Some(sender);
        Some(outcome)
    }

    /// Relay every line from `reader` until EOF; returns the number of commands sent
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let mut sent = 0;
        for line in LossyLines::new(reader) {
            let line = line?;
            if self
                .handle_line(&line, Instant::now())
                .is_some_and(|outcome| outcome.is_sent())
            {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Give back the sender, e.g. to shut it down
    pub fn into_sender(self) -> Option<S> {
        self.sender
    }
}

/// How to start the tracker
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Tracker program
    pub tracker_program: std::path::PathBuf,
    /// Arguments for the tracker
    pub tracker_args: Vec<String>,
    /// Forward angles to the servo rig
    pub live: bool,
    /// Serial settings for the hand server
    pub sender: SenderOptions,
}

/// Start the tracker, relay its output until it exits, then stop the hand server.
///
/// # Errors
///
/// Returns an error if either child process cannot be started or the relay fails
pub fn run_launcher(config: Config, sender_program: &Path, options: &LaunchOptions) -> Result<()> {
    config.validate()?;

    let sender = if options.live {
        Some(PipeSender::spawn(
            sender_program,
            config.dispatch.channel_for_hand(0),
            &options.sender,
        )?)
    } else {
        None
    };

    info!(
        "$ {} {}",
        options.tracker_program.display(),
        options.tracker_args.join(" ")
    );
    let mut tracker = Command::new(&options.tracker_program)
        .args(&options.tracker_args)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| Error::DispatchError(format!("Failed to start process: {e}")))?;
    info!("Running");

    let stdout = tracker
        .stdout
        .take()
        .ok_or_else(|| Error::DispatchError("tracker has no stdout".to_string()))?;

    let mut relay = AngleRelay::new(config, sender);
    let relayed = relay.run(BufReader::new(stdout));

    let status = tracker.wait()?;
    info!("[process exited] {}", status);

    if let Some(mut sender) = relay.into_sender() {
        if let Err(e) = sender.terminate() {
            warn!("Failed to stop hand server: {}", e);
        }
    }

    let sent = relayed?;
    info!("Relayed {} commands", sent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ServoCommand;
    use std::io::Cursor;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Vec<ServoCommand>);

    impl ServoSender for Recorder {
        fn send(&mut self, command: &ServoCommand) -> Result<()> {
            self.0.push(command.clone());
            Ok(())
        }
    }

    #[test]
    fn test_parse_angle_line() {
        assert_eq!(parse_angle_line("ANGLE 0 12.00").unwrap(), (0, 12.0));
        assert_eq!(parse_angle_line("  ANGLE   1   -45.25 \n").unwrap(), (1, -45.25));
        assert!(parse_angle_line("SENT 135").is_err());
        assert!(parse_angle_line("ANGLE").is_err());
        assert!(parse_angle_line("ANGLE x 1.0").is_err());
        assert!(parse_angle_line("ANGLE 0 abc").is_err());
        assert!(parse_angle_line("ANGLE 0 nan").is_err());
        assert!(parse_angle_line("ANGLE 0 1.0 extra").is_err());
    }

    #[test]
    fn test_relay_gates_angles() {
        let mut relay = AngleRelay::new(Config::default(), Some(Recorder::default()));
        let start = Instant::now();

        assert!(relay.handle_line("Starting hand tracker", start).is_none());
        assert!(relay.handle_line("ANGLE 0 0.00", start).unwrap().is_sent());
        assert_eq!(
            relay.handle_line("ANGLE 0 30.00", start + Duration::from_millis(10)),
            Some(DispatchOutcome::SkippedInterval)
        );
        assert!(relay
            .handle_line("ANGLE 0 30.00", start + Duration::from_millis(300))
            .unwrap()
            .is_sent());

        let sent = relay.into_sender().unwrap().0;
        assert_eq!(sent.iter().map(|c| c.angle).collect::<Vec<_>>(), vec![135, 180]);
    }

    #[test]
    fn test_relay_without_sender_only_logs() {
        let mut relay: AngleRelay<Recorder> = AngleRelay::new(Config::default(), None);
        assert!(relay.handle_line("ANGLE 0 10.00", Instant::now()).is_none());
    }

    #[test]
    fn test_relay_run_counts_sent() {
        let mut relay = AngleRelay::new(Config::default(), Some(Recorder::default()));
        let input = "ANGLE 0 0.00\nANGLE 1 45.00\nnoise\n";
        assert_eq!(relay.run(Cursor::new(input)).unwrap(), 2);
    }
}
