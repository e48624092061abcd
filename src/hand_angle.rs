//! Hand rotation angle estimation from two landmarks.
//!
//! The angle is the direction of the vector from a reference origin (the wrist) to a reference
//! direction point (the middle-finger MCP), measured in pixel space with y pointing down.

use crate::{
    constants::{INDEX_MCP, MIDDLE_MCP, PINKY_MCP, WRIST},
    hand_landmarks::{HandObservation, Handedness, Landmark},
    Result,
};
use serde::{Deserialize, Serialize};

/// Which landmark pair defines the hand's rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceVector {
    /// Wrist to middle-finger MCP
    #[default]
    WristMiddle,
    /// Index MCP to pinky MCP; a better roll estimate for some poses
    IndexPinky,
}

impl ReferenceVector {
    const fn indices(self) -> (usize, usize) {
        match self {
            Self::WristMiddle => (WRIST, MIDDLE_MCP),
            Self::IndexPinky => (INDEX_MCP, PINKY_MCP),
        }
    }
}

/// Angle of the vector `to - from` in degrees, in (-180, 180].
///
/// A zero-length vector yields 0.
#[must_use]
pub fn vector_angle_deg(from: (f64, f64), to: (f64, f64)) -> f64 {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;

    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }

    let degrees = dy.atan2(dx).to_degrees();
    // atan2(-0.0, x < 0) lands on -180
    if degrees <= -180.0 {
        180.0
    } else {
        degrees
    }
}

/// Apply the handedness convention: left hands report the mirrored angle
#[must_use]
pub fn normalize_for_handedness(angle_deg: f64, handedness: Option<Handedness>) -> f64 {
    match handedness {
        Some(Handedness::Left) => -angle_deg,
        _ => angle_deg,
    }
}

/// Estimates a raw rotation angle for each detected hand
#[derive(Debug, Clone, Copy)]
pub struct AngleEstimator {
    reference: ReferenceVector,
    frame_width: u32,
    frame_height: u32,
}

impl AngleEstimator {
    #[must_use]
    pub const fn new(reference: ReferenceVector, frame_width: u32, frame_height: u32) -> Self {
        Self {
            reference,
            frame_width,
            frame_height,
        }
    }

    /// Raw angle between two landmarks in a frame of the given size
    #[must_use]
    pub fn angle_between(
        origin: Landmark,
        direction: Landmark,
        handedness: Option<Handedness>,
        width: u32,
        height: u32,
    ) -> f64 {
        let from = origin.to_pixel(width, height);
        let to = direction.to_pixel(width, height);
        normalize_for_handedness(vector_angle_deg(from, to), handedness)
    }

    /// Estimate the raw angle for one hand.
    ///
    /// `frame_size` overrides the configured frame dimensions when the detector reports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the hand lacks the reference landmarks
    pub fn estimate(&self, hand: &HandObservation, frame_size: Option<(u32, u32)>) -> Result<f64> {
        let (width, height) = frame_size.unwrap_or((self.frame_width, self.frame_height));
        let (origin_idx, direction_idx) = self.reference.indices();
        let (origin, direction) = hand.landmark_pair(origin_idx, direction_idx)?;

        Ok(Self::angle_between(origin, direction, hand.handedness, width, height))
    }
}
