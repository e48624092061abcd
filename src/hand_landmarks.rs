//! Per-frame hand landmark input.
//!
//! Pose detection happens outside this crate. Frames arrive as JSON lines, one object per
//! frame, carrying the normalized landmarks and handedness of every detected hand.

use crate::{
    constants::{MIDDLE_MCP, WRIST},
    Error, Result,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// A 2D keypoint in normalized image coordinates (0..1, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position as a fraction of frame width
    pub x: f64,
    /// Vertical position as a fraction of frame height
    pub y: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert to whole-pixel coordinates, truncating toward zero
    #[must_use]
    pub fn to_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (
            (self.x * f64::from(width)).trunc(),
            (self.y * f64::from(height)).trunc(),
        )
    }
}

/// Which hand the detector believes it saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parse a detector label. Anything starting with `l` (any case) is a left hand.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.trim_start().to_lowercase().starts_with('l') {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Wire form of a handedness label; accepts the detector's free-form strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HandednessLabel(Handedness);

impl<'de> Deserialize<'de> for HandednessLabel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self(Handedness::from_label(&label)))
    }
}

/// One detected hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    /// Landmarks in detector order
    pub landmarks: Vec<Landmark>,
    /// Handedness, when the detector reported one
    pub handedness: Option<Handedness>,
}

impl HandObservation {
    #[must_use]
    pub fn new(landmarks: Vec<Landmark>, handedness: Option<Handedness>) -> Self {
        Self { landmarks, handedness }
    }

    /// Two landmarks by index
    ///
    /// # Errors
    ///
    /// Returns an error when the detector delivered too few landmarks
    pub fn landmark_pair(&self, first: usize, second: usize) -> Result<(Landmark, Landmark)> {
        match (self.landmarks.get(first), self.landmarks.get(second)) {
            (Some(a), Some(b)) => Ok((*a, *b)),
            _ => Err(Error::InvalidInput(format!(
                "hand has {} landmarks, need at least {}",
                self.landmarks.len(),
                first.max(second) + 1
            ))),
        }
    }

    /// Wrist and middle-finger MCP, the default pair the rotation angle is measured between
    ///
    /// # Errors
    ///
    /// Returns an error when the detector delivered too few landmarks
    pub fn reference_points(&self) -> Result<(Landmark, Landmark)> {
        self.landmark_pair(WRIST, MIDDLE_MCP)
    }
}

/// All hands detected in one camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame width in pixels, when known
    pub width: Option<u32>,
    /// Frame height in pixels, when known
    pub height: Option<u32>,
    /// Detected hands, index-aligned with their handedness
    pub hands: Vec<HandObservation>,
}

#[derive(Deserialize)]
struct WireHand {
    #[serde(default)]
    handedness: Option<HandednessLabel>,
    landmarks: Vec<Landmark>,
}

#[derive(Deserialize)]
struct WireFrame {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    hands: Vec<WireHand>,
}

impl Frame {
    /// Decode a single JSON frame line
    ///
    /// # Errors
    ///
    /// Returns an error for blank lines and malformed JSON
    pub fn from_json_line(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(Error::InvalidInput("empty frame line".to_string()));
        }

        let wire: WireFrame = serde_json::from_str(line)?;
        Ok(Self {
            // A zero extent would collapse every landmark onto the origin
            width: wire.width.filter(|w| *w > 0),
            height: wire.height.filter(|h| *h > 0),
            hands: wire
                .hands
                .into_iter()
                .map(|h| HandObservation::new(h.landmarks, h.handedness.map(|l| l.0)))
                .collect(),
        })
    }
}

/// Anything that yields landmark frames
pub trait LandmarkSource {
    /// Read the next frame.
    ///
    /// `Ok(None)` means the source is exhausted. Decode errors are transient; callers skip
    /// the frame and read again.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Reads one JSON frame per line from any buffered reader (usually stdin)
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        debug!("Decoding frame line {}", self.line_number);

        let line = std::str::from_utf8(&self.line).map_err(|e| {
            Error::InvalidInput(format!("frame line {} is not UTF-8: {e}", self.line_number))
        })?;
        Frame::from_json_line(line).map(Some)
    }
}
