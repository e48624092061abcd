//! Per-frame hand angle pipeline.
//!
//! For every detected hand: estimate the raw rotation, smooth it, print an `ANGLE` line and
//! offer the smoothed value to that hand's dispatch gate.

use crate::{
    config::Config,
    constants::ANGLE_LINE_PREFIX,
    dispatch::{DispatchGate, DispatchOutcome, ServoSender},
    filters::AngleFilter,
    hand_angle::AngleEstimator,
    hand_landmarks::Frame,
    Result,
};
use log::{debug, warn};
use std::io::Write;
use std::time::Instant;

/// Render one line of the tracker's stdout protocol
#[must_use]
pub fn format_angle_line(hand_index: usize, angle_deg: f64) -> String {
    format!("{ANGLE_LINE_PREFIX} {hand_index} {angle_deg:.2}")
}

/// Smoothing and dispatch state for one tracked hand
pub struct HandState {
    filter: Box<dyn AngleFilter>,
    gate: DispatchGate,
}

impl HandState {
    #[must_use]
    pub fn new(filter: Box<dyn AngleFilter>, gate: DispatchGate) -> Self {
        Self { filter, gate }
    }

    /// Last smoothed angle
    #[must_use]
    pub fn smoothed(&self) -> Option<f64> {
        self.filter.current()
    }

    #[must_use]
    pub const fn gate(&self) -> &DispatchGate {
        &self.gate
    }
}

/// What happened to one hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandReport {
    /// Position of the hand in the detector's output
    pub hand_index: usize,
    /// Angle before smoothing
    pub raw_angle: f64,
    /// Angle after smoothing
    pub smoothed_angle: f64,
    /// Dispatch result; `None` when sending is disabled
    pub dispatch: Option<DispatchOutcome>,
}

/// Frame-driven hand tracker
pub struct HandTracker<W: Write> {
    config: Config,
    estimator: AngleEstimator,
    states: Vec<HandState>,
    sender: Option<Box<dyn ServoSender>>,
    out: W,
}

impl<W: Write> HandTracker<W> {
    /// Create a tracker writing `ANGLE` lines to `out`.
    ///
    /// With `sender` set to `None` angles are printed but never dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config, sender: Option<Box<dyn ServoSender>>, out: W) -> Result<Self> {
        config.validate()?;
        let estimator = AngleEstimator::new(
            config.tracker.reference,
            config.tracker.frame_width,
            config.tracker.frame_height,
        );

        Ok(Self {
            config,
            estimator,
            states: Vec::new(),
            sender,
            out,
        })
    }

    /// State slot for a hand; every hand maps to slot 0 in shared mode
    const fn slot(&self, hand_index: usize) -> usize {
        if self.config.smoothing.shared_state {
            0
        } else {
            hand_index
        }
    }

    fn state_mut(&mut self, slot: usize) -> Result<&mut HandState> {
        while self.states.len() <= slot {
            let index = self.states.len();
            let filter = self.config.create_filter()?;
            let gate = DispatchGate::new(self.config.gate_config(index));
            self.states.push(HandState::new(filter, gate));
        }
        Ok(&mut self.states[slot])
    }

    /// Tracking state for a hand, once it has been seen
    #[must_use]
    pub fn state(&self, hand_index: usize) -> Option<&HandState> {
        self.states.get(self.slot(hand_index))
    }

    /// Process all hands of one frame at time `now`
    ///
    /// # Errors
    ///
    /// Returns an error only if the output stream fails; bad hands are logged and skipped
    pub fn process_frame(&mut self, frame: &Frame, now: Instant) -> Result<Vec<HandReport>> {
        let frame_size = frame.width.zip(frame.height);
        let mut reports = Vec::with_capacity(frame.hands.len());

        for (hand_index, hand) in frame.hands.iter().enumerate().take(self.config.tracker.max_hands) {
            let raw_angle = match self.estimator.estimate(hand, frame_size) {
                Ok(angle) => angle,
                Err(e) => {
                    warn!("Skipping hand {}: {}", hand_index, e);
                    continue;
                }
            };

            let slot = self.slot(hand_index);
            let smoothed_angle = self.state_mut(slot)?.filter.apply(raw_angle);
            debug!("Hand {}: raw {:.2}, smoothed {:.2}", hand_index, raw_angle, smoothed_angle);

            writeln!(self.out, "{}", format_angle_line(hand_index, smoothed_angle))?;

            let dispatch = match self.sender.as_mut() {
                Some(sender) => Some(self.states[slot].gate.try_dispatch(smoothed_angle, now, sender)),
                None => None,
            };

            reports.push(HandReport {
                hand_index,
                raw_angle,
                smoothed_angle,
                dispatch,
            });
        }

        self.out.flush()?;
        Ok(reports)
    }

    /// The output stream
    pub fn output(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{MIDDLE_MCP, WRIST},
        dispatch::ServoCommand,
        hand_landmarks::{HandObservation, Handedness, Landmark},
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<Vec<ServoCommand>>>);

    impl ServoSender for SharedLog {
        fn send(&mut self, command: &ServoCommand) -> Result<()> {
            self.0.lock().unwrap().push(command.clone());
            Ok(())
        }
    }

    /// Hand whose wrist-to-middle vector points at `angle_deg` in a 1000x1000 frame
    fn hand_at(angle_deg: f64, handedness: Option<Handedness>) -> HandObservation {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); 21];
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        landmarks[WRIST] = Landmark::new(0.5, 0.5);
        landmarks[MIDDLE_MCP] = Landmark::new(0.5 + 0.3 * cos, 0.5 + 0.3 * sin);
        HandObservation::new(landmarks, handedness)
    }

    fn frame(hands: Vec<HandObservation>) -> Frame {
        Frame {
            width: Some(1000),
            height: Some(1000),
            hands,
        }
    }

    #[test]
    fn test_angle_line_format() {
        assert_eq!(format_angle_line(0, 12.0), "ANGLE 0 12.00");
        assert_eq!(format_angle_line(1, -9.599), "ANGLE 1 -9.60");
    }

    #[test]
    fn test_frame_prints_one_line_per_hand() {
        let mut tracker = HandTracker::new(Config::default(), None, Vec::new()).unwrap();
        let reports = tracker
            .process_frame(&frame(vec![hand_at(0.0, None), hand_at(90.0, None)]), Instant::now())
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.dispatch.is_none()));
        let text = String::from_utf8(tracker.output().clone()).unwrap();
        assert_eq!(text, "ANGLE 0 0.00\nANGLE 1 90.00\n");
    }

    #[test]
    fn test_per_hand_smoothing_is_independent() {
        let mut tracker = HandTracker::new(Config::default(), None, Vec::new()).unwrap();
        let now = Instant::now();
        tracker.process_frame(&frame(vec![hand_at(0.0, None), hand_at(60.0, None)]), now).unwrap();
        let reports = tracker
            .process_frame(&frame(vec![hand_at(0.0, None), hand_at(60.0, None)]), now)
            .unwrap();

        assert!(reports[0].smoothed_angle.abs() < 0.5);
        assert!((reports[1].smoothed_angle - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_shared_state_mixes_hands() {
        let mut config = Config::default();
        config.smoothing.shared_state = true;
        let mut tracker = HandTracker::new(config, None, Vec::new()).unwrap();

        let reports = tracker
            .process_frame(&frame(vec![hand_at(0.0, None), hand_at(60.0, None)]), Instant::now())
            .unwrap();

        // The second hand is smoothed against the first hand's value
        assert!((reports[1].smoothed_angle - 12.0).abs() < 0.5);
    }

    #[test]
    fn test_dispatch_per_hand_channels() {
        let mut config = Config::default();
        config.dispatch.channels = vec![0, 1];
        let log = SharedLog::default();
        let mut tracker = HandTracker::new(config, Some(Box::new(log.clone())), Vec::new()).unwrap();

        let start = Instant::now();
        tracker
            .process_frame(&frame(vec![hand_at(0.0, None), hand_at(-90.0, None)]), start)
            .unwrap();
        // Within the interval: nothing new goes out
        tracker
            .process_frame(&frame(vec![hand_at(45.0, None), hand_at(45.0, None)]), start + Duration::from_millis(50))
            .unwrap();

        let sent = log.0.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!((sent[0].channel, sent[0].angle), (0, 135));
        assert_eq!((sent[1].channel, sent[1].angle), (1, 0));
    }

    #[test]
    fn test_bad_hand_is_skipped() {
        let mut tracker = HandTracker::new(Config::default(), None, Vec::new()).unwrap();
        let broken = HandObservation::new(vec![Landmark::new(0.1, 0.1); 3], None);
        let reports = tracker
            .process_frame(&frame(vec![broken, hand_at(30.0, Some(Handedness::Left))]), Instant::now())
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].hand_index, 1);
        assert!((reports[0].raw_angle + 30.0).abs() < 0.2);
    }

    #[test]
    fn test_max_hands_limit() {
        let mut config = Config::default();
        config.tracker.max_hands = 1;
        let mut tracker = HandTracker::new(config, None, Vec::new()).unwrap();
        let reports = tracker
            .process_frame(&frame(vec![hand_at(0.0, None), hand_at(10.0, None)]), Instant::now())
            .unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.mapping.in_max = config.mapping.in_min;
        assert!(HandTracker::new(config, None, Vec::new()).is_err());
    }
}
