//! Injectable time source.
//!
//! The rate window and the alert cadence both depend on elapsed wall-clock
//! time. Routing every read through [`Clock`] lets tests and recorded replays
//! drive time explicitly.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Monotonic time in seconds
pub trait Clock: Send {
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock.
///
/// Clones share the same time, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, seconds: f64) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
