//! Temporal smoothing of per-frame EAR samples.
//!
//! Smoothing damps single-frame landmark jitter while keeping latency low
//! enough that a blink lasting only a couple of frames still crosses the
//! closure threshold.

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{constants::DEFAULT_SMOOTHING_ALPHA, Error, Result};

/// Trait for all EAR smoothing filters
pub trait EarFilter: Send + Sync {
    /// Feed one raw sample and return the smoothed value
    fn apply(&mut self, value: f64) -> f64;

    /// Most recent output, if any sample has been seen
    fn last(&self) -> Option<f64>;

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

impl EarFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        self.last = Some(value);
        value
    }

    fn last(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a filter from a description string such as `"exponential"`,
/// `"exponential:0.6"` or `"none"`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for unknown names or bad parameters.
pub fn create_filter(description: &str) -> Result<Box<dyn EarFilter>> {
    let mut parts = description.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let param = parts.next();
    if parts.next().is_some() {
        return Err(Error::InvalidInput(format!("Too many filter parameters: {description}")));
    }

    match name.as_str() {
        "none" | "nofilter" => match param {
            None => Ok(Box::new(NoFilter::default())),
            Some(_) => Err(Error::InvalidInput("Filter 'none' takes no parameters".to_string())),
        },
        "exponential" => {
            let alpha = match param {
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidInput(format!("Alpha is not a number: {raw}")))?,
                None => DEFAULT_SMOOTHING_ALPHA,
            };
            Ok(Box::new(exponential::ExponentialFilter::try_new(alpha)?))
        }
        _ => Err(Error::InvalidInput(format!("Unknown filter type: {description}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter::default();
        assert_eq!(filter.last(), None);
        assert_eq!(filter.apply(0.31), 0.31);
        assert_eq!(filter.last(), Some(0.31));
        filter.reset();
        assert_eq!(filter.last(), None);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("exponential").is_ok());
        assert!(create_filter("exponential:0.5").is_ok());
        assert!(create_filter("kalman").is_err());
        assert!(create_filter("exponential:abc").is_err());
        assert!(create_filter("exponential:1.5").is_err());
        assert!(create_filter("exponential:0.5:1").is_err());
        assert!(create_filter("none:3").is_err());
    }

    #[test]
    fn test_default_exponential_weight() {
        let mut filter = create_filter("exponential").unwrap();
        filter.apply(0.2);
        let smoothed = filter.apply(0.3);
        assert!((smoothed - (0.7 * 0.3 + 0.3 * 0.2)).abs() < 1e-12);
    }
}
