//! Linear rescaling of camera angles into servo units.

use crate::{
    constants::{DEFAULT_IN_MAX, DEFAULT_IN_MIN, DEFAULT_OUT_MAX, DEFAULT_OUT_MIN},
    utils::safe_cast::round_to_i32,
    Result,
};

/// Clamp `x` to `[in_min, in_max]` and rescale it linearly onto `[out_min, out_max]`.
///
/// `in_min` and `in_max` must differ; equal bounds divide by zero. Config validation rejects
/// them before a mapper is ever built.
#[must_use]
pub fn map_range(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let x = if x < in_min {
        in_min
    } else if x > in_max {
        in_max
    } else {
        x
    };
    out_min + (x - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// A fixed input and output domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMapper {
    pub in_min: f64,
    pub in_max: f64,
    pub out_min: f64,
    pub out_max: f64,
}

impl Default for RangeMapper {
    fn default() -> Self {
        Self::new(DEFAULT_IN_MIN, DEFAULT_IN_MAX, DEFAULT_OUT_MIN, DEFAULT_OUT_MAX)
    }
}

impl RangeMapper {
    #[must_use]
    pub const fn new(in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            in_min,
            in_max,
            out_min,
            out_max,
        }
    }

    #[must_use]
    pub fn map(&self, x: f64) -> f64 {
        map_range(x, self.in_min, self.in_max, self.out_min, self.out_max)
    }

    /// Map and round to the integer units the servo board accepts
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped value is not finite
    pub fn map_to_servo(&self, x: f64) -> Result<i32> {
        round_to_i32(self.map(x))
    }

    /// The mapper going the other way
    #[must_use]
    pub const fn inverse(&self) -> Self {
        Self::new(self.out_min, self.out_max, self.in_min, self.in_max)
    }
}
