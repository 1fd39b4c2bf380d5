//! Blink rate over a trailing time window.

use crate::constants::RATE_WINDOW_SECS;
use std::collections::VecDeque;

/// Sliding window of blink timestamps.
///
/// With the default 60 s window the number of retained blinks is directly
/// the blinks-per-minute rate.
#[derive(Debug, Clone, PartialEq)]
pub struct BlinkRateWindow {
    window_secs: f64,
    timestamps: VecDeque<f64>,
}

impl BlinkRateWindow {
    /// Create a window spanning `window_secs` seconds.
    ///
    /// # Panics
    ///
    /// Panics if the window is not positive.
    #[must_use]
    pub fn new(window_secs: f64) -> Self {
        assert!(window_secs > 0.0, "Rate window must be positive");
        Self {
            window_secs,
            timestamps: VecDeque::new(),
        }
    }

    /// Record a confirmed blink
    pub fn record(&mut self, timestamp: f64) {
        self.timestamps.push_back(timestamp);
    }

    /// Drop every timestamp more than one window older than `now`
    pub fn expire(&mut self, now: f64) {
        self.timestamps.retain(|&t| now - t <= self.window_secs);
    }

    /// Maintenance pass followed by the current count
    pub fn blinks_per_minute(&mut self, now: f64) -> usize {
        self.expire(now);
        self.timestamps.len()
    }

    /// Count without maintenance
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }
}

impl Default for BlinkRateWindow {
    fn default() -> Self {
        Self::new(RATE_WINDOW_SECS)
    }
}
