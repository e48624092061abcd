use super::AngleFilter;

/// Exponential smoothing filter.
///
/// The first sample passes through unchanged; after that each output is
/// `alpha * raw + (1 - alpha) * previous`, so it always lies between the previous output and
/// the new sample.
///
/// This is plain linear smoothing. It knows nothing about the +/-180 degree seam: a hand
/// flicking from 179 to -179 is averaged through 0, not across 180.
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    smoothed: Option<f64>,
}

impl ExponentialFilter {
    /// Create a new exponential filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, smoothed: None }
    }

    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Feed one raw sample
    pub fn update(&mut self, raw: f64) -> f64 {
        let next = match self.smoothed {
            Some(last) => self.alpha * raw + (1.0 - self.alpha) * last,
            None => raw,
        };
        self.smoothed = Some(next);
        next
    }
}

impl AngleFilter for ExponentialFilter {
    fn apply(&mut self, angle: f64) -> f64 {
        self.update(angle)
    }

    fn current(&self) -> Option<f64> {
        self.smoothed
    }

    fn reset(&mut self) {
        self.smoothed = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.2);

        // First value passes through
        assert_eq!(filter.update(10.0), 10.0);

        // 0.2 * 20 + 0.8 * 10
        assert!((filter.update(20.0) - 12.0).abs() < 1e-12);

        // 0.2 * 0 + 0.8 * 12
        assert!((filter.update(0.0) - 9.6).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_bounds() {
        // Alpha of one disables smoothing
        let mut filter = ExponentialFilter::new(1.0);
        filter.update(10.0);
        assert_eq!(filter.update(20.0), 20.0);

        // Low alpha = more smoothing
        let mut filter = ExponentialFilter::new(0.1);
        filter.update(10.0);
        assert!((filter.update(20.0) - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_wraparound_is_not_handled() {
        let mut filter = ExponentialFilter::new(0.5);
        filter.update(179.0);
        let out = filter.update(-179.0);
        assert!(out.abs() < 1e-9, "linear smoothing averages through zero, got {out}");
    }

    #[test]
    fn test_reset() {
        let mut filter = ExponentialFilter::new(0.2);
        filter.update(50.0);
        filter.reset();
        assert_eq!(filter.current(), None);
        assert_eq!(filter.update(-20.0), -20.0);
    }
}
