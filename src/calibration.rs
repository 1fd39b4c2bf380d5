//! Baseline EAR calibration.
//!
//! The first frames with a detected face are collected into a window. When
//! the window is full the baseline "eyes open" EAR is fixed at a high
//! percentile of the window rather than its mean, so the few blink frames
//! that leak into the window do not drag the baseline down.

use log::{debug, info};

/// Statistical summary of the calibration window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
}

impl Statistics {
    /// Summary of a non-empty sample; `None` when empty
    #[must_use]
    pub fn from_samples(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min: data.iter().copied().fold(f64::INFINITY, f64::min),
            max: data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Value at rank `floor(fraction * n)` of the ascending-sorted sample.
///
/// The rank is clamped to the last element. Returns `None` for an empty
/// sample.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile_value(data: &[f64], fraction: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = ((sorted.len() as f64) * fraction).floor().max(0.0) as usize;
    sorted.get(rank.min(sorted.len() - 1)).copied()
}

/// Result of a completed calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub baseline_ear: f64,
    pub std_dev: f64,
    pub samples: usize,
}

/// What one calibration step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    /// Sample stored, window not yet full
    Collecting { progress_percent: u8 },
    /// This sample completed the window
    Completed(CalibrationResult),
    /// Baseline already fixed; sample ignored
    AlreadyCalibrated,
}

/// Collects the calibration window and freezes the baseline once.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibrator {
    target_frames: usize,
    percentile: f64,
    frame_count: usize,
    collected_ears: Vec<f64>,
    baseline_ear: Option<f64>,
    std_dev: Option<f64>,
}

impl Calibrator {
    /// Create a calibrator for `target_frames` samples.
    ///
    /// # Panics
    ///
    /// Panics if `target_frames` is zero or `percentile` is outside `[0, 1]`.
    #[must_use]
    pub fn new(target_frames: usize, percentile: f64) -> Self {
        assert!(target_frames > 0, "Calibration window must be greater than 0");
        assert!((0.0..=1.0).contains(&percentile), "Percentile must be in [0, 1]");
        Self {
            target_frames,
            percentile,
            frame_count: 0,
            collected_ears: Vec::with_capacity(target_frames),
            baseline_ear: None,
            std_dev: None,
        }
    }

    /// Feed the smoothed EAR of one frame with a face
    pub fn observe(&mut self, smoothed_ear: f64) -> CalibrationStep {
        if self.baseline_ear.is_some() {
            return CalibrationStep::AlreadyCalibrated;
        }

        self.frame_count += 1;
        self.collected_ears.push(smoothed_ear);

        if self.frame_count < self.target_frames {
            debug!("Calibration sample {}/{}: {smoothed_ear:.4}", self.frame_count, self.target_frames);
            return CalibrationStep::Collecting {
                progress_percent: self.progress_percent(),
            };
        }

        let baseline = percentile_value(&self.collected_ears, self.percentile).unwrap_or(smoothed_ear);
        let std_dev = Statistics::from_samples(&self.collected_ears).map_or(0.0, |s| s.std_dev);
        self.baseline_ear = Some(baseline);
        self.std_dev = Some(std_dev);

        info!("Calibration complete - Baseline EAR: {baseline:.4}, StdDev: {std_dev:.4}");
        CalibrationStep::Completed(CalibrationResult {
            baseline_ear: baseline,
            std_dev,
            samples: self.collected_ears.len(),
        })
    }

    /// Integer percent of the window collected so far
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn progress_percent(&self) -> u8 {
        let percent = self.frame_count.min(self.target_frames) * 100 / self.target_frames;
        percent as u8
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.baseline_ear.is_some()
    }

    #[must_use]
    pub fn baseline_ear(&self) -> Option<f64> {
        self.baseline_ear
    }

    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        self.std_dev
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[must_use]
    pub fn target_frames(&self) -> usize {
        self.target_frames
    }

    #[must_use]
    pub fn collected_ears(&self) -> &[f64] {
        &self.collected_ears
    }
}
