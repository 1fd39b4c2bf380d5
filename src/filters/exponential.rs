use super::EarFilter;
use crate::{Error, Result};

/// Exponential smoothing filter.
///
/// `smoothed = alpha * raw + (1 - alpha) * previous`; the first sample passes
/// through unchanged.
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// Fallible constructor for values coming from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `alpha` is outside `(0, 1]`.
    pub fn try_new(alpha: f64) -> Result<Self> {
        if alpha > 0.0 && alpha <= 1.0 {
            Ok(Self { alpha, last: None })
        } else {
            Err(Error::InvalidInput(format!("Alpha must be in (0, 1], got {alpha}")))
        }
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl EarFilter for ExponentialFilter {
    fn apply(&mut self, value: f64) -> f64 {
        let smoothed = match self.last {
            Some(last) => self.alpha * value + (1.0 - self.alpha) * last,
            None => value,
        };
        self.last = Some(smoothed);
        smoothed
    }

    fn last(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.last = None;
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
        let mut filter = ExponentialFilter::new(0.5);

        // First value passes through
        assert_eq!(filter.apply(10.0), 10.0);

        // Second value is smoothed
        assert_eq!(filter.apply(20.0), 15.0); // 0.5 * 20 + 0.5 * 10
    }

    #[test]
    fn test_blink_weights() {
        let mut filter = ExponentialFilter::new(0.7);
        filter.apply(0.30);
        let dipped = filter.apply(0.10);
        assert!((dipped - 0.16).abs() < 1e-12); // 0.7 * 0.10 + 0.3 * 0.30
        let next = filter.apply(0.10);
        assert!((next - 0.118).abs() < 1e-12); // 0.7 * 0.10 + 0.3 * 0.16
    }

    #[test]
    fn test_reset_restarts_pass_through() {
        let mut filter = ExponentialFilter::new(0.7);
        filter.apply(0.3);
        filter.reset();
        assert_eq!(filter.apply(0.2), 0.2);
    }

    #[test]
    #[should_panic(expected = "Alpha must be in (0, 1]")]
    fn test_zero_alpha_panics() {
        let _ = ExponentialFilter::new(0.0);
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(ExponentialFilter::try_new(0.0).is_err());
        assert!(ExponentialFilter::try_new(1.01).is_err());
        assert!(ExponentialFilter::try_new(1.0).is_ok());
    }
}
