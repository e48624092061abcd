//! Checked float-to-integer conversions for servo values

use crate::{Error, Result};

/// Safely convert f64 to i32, truncating toward zero
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
pub fn f64_to_i32(value: f64) -> Result<i32> {
    if value.is_finite() && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Ok(value as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to i32"
        )))
    }
}

/// Round f64 to the nearest i32, ties to even
///
/// # Errors
///
/// Returns an error if the rounded value is not finite or outside i32 range
pub fn round_to_i32(value: f64) -> Result<i32> {
    f64_to_i32(value.round_ties_even())
}
