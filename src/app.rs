//! Main tracking application: read landmark frames, run the pipeline, dispatch commands.

use crate::{
    config::{Config, SenderMode},
    dispatch::ServoSender,
    error::{Error, Result},
    hand_landmarks::LandmarkSource,
    sender::{resolve_sender_program, NullSender, PipeSender, SenderOptions, SpawnSender},
    tracker::HandTracker,
};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// Counters from one run of the frame loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames decoded and processed
    pub frames: usize,
    /// Lines that could not be decoded
    pub skipped: usize,
    /// Commands handed to the sender
    pub dispatched: usize,
}

/// Build the sender selected by the configuration.
///
/// `no_send` keeps the pipeline running but only logs what would have been sent. `config_path`
/// is handed on to the `send` processes so they open the port the same way.
///
/// # Errors
///
/// Returns an error if the sender program cannot be resolved or the serve process fails to start
pub fn build_sender(
    config: &Config,
    config_path: Option<&Path>,
    no_send: bool,
) -> Result<Option<Box<dyn ServoSender>>> {
    if no_send {
        info!("Sending disabled (--no-send)");
        return Ok(Some(Box::new(NullSender::default())));
    }
    if !config.dispatch.enabled {
        info!("Dispatch disabled in configuration");
        return Ok(None);
    }

    let program = resolve_sender_program(config.dispatch.sender_program.as_deref())?;
    let options = SenderOptions::from_config(config, config_path);
    match config.dispatch.mode {
        SenderMode::Spawn => {
            info!("Dispatching through one-shot sender processes: {}", program.display());
            Ok(Some(Box::new(SpawnSender::new(program, options))))
        }
        SenderMode::Pipe => {
            let sender = PipeSender::spawn(&program, config.dispatch.channel_for_hand(0), &options)?;
            Ok(Some(Box::new(sender)))
        }
    }
}

/// Hand tracking application
pub struct TrackerApp<W: Write> {
    tracker: HandTracker<W>,
}

impl<W: Write> TrackerApp<W> {
    /// Create the application around a ready sender
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config, sender: Option<Box<dyn ServoSender>>, out: W) -> Result<Self> {
        info!("Initializing hand tracker");
        Ok(Self {
            tracker: HandTracker::new(config, sender, out)?,
        })
    }

    /// Run until the source is exhausted.
    ///
    /// Undecodable frames are skipped; only I/O failures on the source or the output end the loop
    /// early.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing the output fails
    pub fn run<S: LandmarkSource>(&mut self, source: &mut S) -> Result<RunStats> {
        info!("Starting hand tracker");

        let mut stats = RunStats::default();
        let mut window_frames = 0usize;
        let mut window_start = Instant::now();

        loop {
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of landmark input reached");
                    break;
                }
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    warn!("Failed to read frame, skipping: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };

            let reports = self.tracker.process_frame(&frame, Instant::now())?;
            stats.frames += 1;
            stats.dispatched += reports
                .iter()
                .filter(|r| r.dispatch.as_ref().is_some_and(|d| d.is_sent()))
                .count();

            window_frames += 1;
            let elapsed = window_start.elapsed();
            if elapsed >= Duration::from_secs(1) {
                debug!("FPS: {:.1}", window_frames as f64 / elapsed.as_secs_f64());
                window_frames = 0;
                window_start = Instant::now();
            }
        }

        info!(
            "Hand tracker shutting down: {} frames, {} skipped, {} commands sent",
            stats.frames, stats.skipped, stats.dispatched
        );
        Ok(stats)
    }

    /// The tracker driving this application
    pub const fn tracker(&self) -> &HandTracker<W> {
        &self.tracker
    }
}
