//! Signal filtering for smoothing hand rotation angles.
//!
//! Filters operate on a single angle stream. Each tracked hand owns its own filter instance.

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{
    constants::{DEFAULT_SMOOTHING_ALPHA, SMOOTHING_ALPHA_MAX, SMOOTHING_ALPHA_MIN},
    Error, Result,
};

/// Trait for all angle filters
pub trait AngleFilter: Send + Sync {
    /// Feed a raw angle and return the filtered one
    fn apply(&mut self, angle: f64) -> f64;

    /// Last filtered value, if any sample has been seen
    fn current(&self) -> Option<f64>;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
#[derive(Debug, Default)]
pub struct NoFilter {
    last: Option<f64>,
}

impl AngleFilter for NoFilter {
    fn apply(&mut self, angle: f64) -> f64 {
        self.last = Some(angle);
        angle
    }

    fn current(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Check an exponential smoothing factor
///
/// # Errors
///
/// Returns an error unless alpha lies in (0, 1]
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > SMOOTHING_ALPHA_MIN && alpha <= SMOOTHING_ALPHA_MAX {
        Ok(())
    } else {
        Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")))
    }
}

/// Create an angle filter from a type description.
///
/// Accepted forms: `none`, `exponential`, `exponential:<alpha>`.
///
/// # Errors
///
/// Returns an error for unknown filter types or invalid parameters
pub fn create_filter(filter_type: &str) -> Result<Box<dyn AngleFilter>> {
    let lowered = filter_type.trim().to_lowercase();
    let mut parts = lowered.split(':');
    let name = parts.next().unwrap_or_default();
    let param = parts.next();

    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters: {filter_type}")));
    }

    match (name, param) {
        ("none" | "nofilter", None) => Ok(Box::new(NoFilter::default())),
        ("exponential" | "ema", None) => Ok(Box::new(exponential::ExponentialFilter::new(DEFAULT_SMOOTHING_ALPHA))),
        ("exponential" | "ema", Some(alpha)) => {
            let alpha: f64 = alpha
                .parse()
                .map_err(|_| Error::FilterError(format!("Invalid alpha: {alpha}")))?;
            validate_alpha(alpha)?;
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter::default();
        assert_eq!(filter.current(), None);
        assert_eq!(filter.apply(10.0), 10.0);
        assert_eq!(filter.current(), Some(10.0));
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("exponential").is_ok());
        assert!(create_filter("Exponential:0.5").is_ok());
        assert!(create_filter("unknown").is_err());
        assert!(create_filter("none:3").is_err());
        assert!(create_filter("exponential:0.5:1").is_err());
    }

    #[test]
    fn test_create_filter_rejects_bad_alpha() {
        for desc in ["exponential:0", "exponential:1.5", "exponential:-0.1", "exponential:abc"] {
            match create_filter(desc) {
                Err(Error::FilterError(msg)) => assert!(msg.contains("lpha"), "{desc}: {msg}"),
                _ => panic!("Expected FilterError for {desc}"),
            }
        }
    }
}
