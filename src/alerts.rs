//! Wellbeing advisories based on blink rate.
//!
//! The policy is gated by elapsed time since the last advisory, not by frame
//! count, so the cadence is independent of the camera's frame rate.

use crate::{
    config::AlertConfig,
    constants::{FAST_BLINK_THRESHOLD, NOTIFICATION_INTERVAL_SECS, SLOW_BLINK_THRESHOLD},
};
use log::info;
use std::fmt;

/// Advisory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    Started,
    CalibrationComplete,
    /// Blink rate below the slow threshold
    Fatigue,
    /// Blink rate above the fast threshold
    Stress,
    /// Blink rate within the normal range
    Normal,
    Stopped,
}

/// A user-facing advisory ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub title: String,
    pub message: String,
    /// Blink rate the advisory was based on, for rate advisories
    pub bpm: Option<usize>,
}

impl Advisory {
    #[must_use]
    pub fn started() -> Self {
        Self {
            kind: AdvisoryKind::Started,
            title: "Blink Monitor Started".to_string(),
            message: "Monitoring your blink rate. Will notify you periodically if your blink rate is abnormal."
                .to_string(),
            bpm: None,
        }
    }

    #[must_use]
    pub fn calibration_complete() -> Self {
        Self {
            kind: AdvisoryKind::CalibrationComplete,
            title: "Calibration Complete".to_string(),
            message: "Blink monitor has been calibrated and is now tracking your blink rate.".to_string(),
            bpm: None,
        }
    }

    #[must_use]
    pub fn stopped() -> Self {
        Self {
            kind: AdvisoryKind::Stopped,
            title: "Blink Monitor Stopped".to_string(),
            message: "Blink rate monitoring has been stopped.".to_string(),
            bpm: None,
        }
    }

    #[must_use]
    pub fn fatigue(bpm: usize) -> Self {
        Self {
            kind: AdvisoryKind::Fatigue,
            title: "Low Blink Rate Detected".to_string(),
            message: format!(
                "Your current blink rate is {bpm} blinks per minute. This is below the recommended rate \
                 and may indicate fatigue. Consider taking a break."
            ),
            bpm: Some(bpm),
        }
    }

    #[must_use]
    pub fn stress(bpm: usize) -> Self {
        Self {
            kind: AdvisoryKind::Stress,
            title: "High Blink Rate Detected".to_string(),
            message: format!(
                "Your current blink rate is {bpm} blinks per minute. This is above the normal rate \
                 and may indicate stress. Consider taking a short break to relax."
            ),
            bpm: Some(bpm),
        }
    }

    #[must_use]
    pub fn normal(bpm: usize) -> Self {
        Self {
            kind: AdvisoryKind::Normal,
            title: "Normal Blink Rate".to_string(),
            message: format!("Your current blink rate is {bpm} blinks per minute, which is within the normal range."),
            bpm: Some(bpm),
        }
    }

    /// Short on-screen status line for rate advisories
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        let bpm = self.bpm?;
        match self.kind {
            AdvisoryKind::Fatigue => Some(format!("Slow Blink Rate! ({bpm} BPM) - You may be fatigued.")),
            AdvisoryKind::Stress => Some(format!("Fast Blink Rate! ({bpm} BPM) - You may be stressed.")),
            AdvisoryKind::Normal => Some(format!("Normal Blink Rate ({bpm} BPM)")),
            _ => None,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.message)
    }
}

/// Periodic blink-rate classifier with a cooldown clock
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPolicy {
    interval_secs: f64,
    slow_threshold: usize,
    fast_threshold: usize,
    last_notification_time: f64,
}

impl AlertPolicy {
    /// Create a policy whose first advisory is due one interval after `now`.
    ///
    /// # Panics
    ///
    /// Panics if the interval is not positive or the slow threshold exceeds
    /// the fast one.
    #[must_use]
    pub fn new(interval_secs: f64, slow_threshold: usize, fast_threshold: usize, now: f64) -> Self {
        assert!(interval_secs > 0.0, "Notification interval must be positive");
        assert!(
            slow_threshold <= fast_threshold,
            "Slow blink threshold must not exceed fast blink threshold"
        );
        Self {
            interval_secs,
            slow_threshold,
            fast_threshold,
            last_notification_time: now,
        }
    }

    #[must_use]
    pub fn from_config(config: &AlertConfig, now: f64) -> Self {
        Self::new(
            config.interval_secs,
            config.slow_blink_threshold,
            config.fast_blink_threshold,
            now,
        )
    }

    /// Classify a blink rate without touching the cooldown
    #[must_use]
    pub fn classify(&self, bpm: usize) -> Advisory {
        if bpm < self.slow_threshold {
            Advisory::fatigue(bpm)
        } else if bpm > self.fast_threshold {
            Advisory::stress(bpm)
        } else {
            Advisory::normal(bpm)
        }
    }

    /// Emit one advisory if an interval has elapsed, restarting the cooldown
    pub fn evaluate(&mut self, now: f64, bpm: usize) -> Option<Advisory> {
        if now - self.last_notification_time < self.interval_secs {
            return None;
        }
        self.last_notification_time = now;
        let advisory = self.classify(bpm);
        info!("Blink rate advisory: {} ({bpm} BPM)", advisory.title);
        Some(advisory)
    }

    /// Restart the cooldown so the next advisory is due one interval after `now`
    pub fn restart(&mut self, now: f64) {
        self.last_notification_time = now;
    }

    /// Whole seconds until the next advisory is due, never negative
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn seconds_until_next(&self, now: f64) -> u64 {
        let remaining = self.interval_secs - (now - self.last_notification_time);
        remaining.max(0.0).trunc() as u64
    }

    #[must_use]
    pub fn last_notification_time(&self) -> f64 {
        self.last_notification_time
    }

    #[must_use]
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(NOTIFICATION_INTERVAL_SECS, SLOW_BLINK_THRESHOLD, FAST_BLINK_THRESHOLD, 0.0)
    }
}
