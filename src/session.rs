//! Per-frame blink monitoring pipeline.
//!
//! [`MonitorSession`] owns every piece of cross-frame state (smoothing slot,
//! calibration window, blink state machine, rate window, advisory cooldown)
//! and runs the stages in order for one frame at a time:
//!
//! geometry → openness → smoothing → calibration xor classification →
//! state machine → rate window → advisories.

use crate::{
    alerts::{Advisory, AlertPolicy},
    blink_fsm::{BlinkLimits, BlinkState, BlinkStateMachine, Transition},
    calibration::{CalibrationResult, CalibrationStep, Calibrator},
    clock::Clock,
    config::{BlinkConfig, Config},
    eye_openness::{EarMeasurement, EyeOpennessCalculator},
    filters::EarFilter,
    geometry::{estimate_head_rotation, GlassesDetector, HeadRotation},
    landmarks::LandmarkSet,
    notification::NotificationDispatcher,
    rate::BlinkRateWindow,
    Result,
};
use log::{debug, info};

/// Openness sample for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSample {
    pub raw_ear: f64,
    pub smoothed_ear: f64,
    /// Closure decision, absent while calibrating
    pub is_closed: Option<bool>,
    /// Adaptive threshold, absent while calibrating
    pub threshold: Option<f64>,
}

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating { progress_percent: u8 },
    Tracking,
}

/// Everything the pipeline produced for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub timestamp: f64,
    pub face_detected: bool,
    pub rotation: Option<HeadRotation>,
    pub glasses_detected: bool,
    pub ear: Option<EarMeasurement>,
    pub sample: Option<EyeSample>,
    pub phase: Phase,
    pub calibration: Option<CalibrationResult>,
    pub transition: Option<Transition>,
    pub blink_state: BlinkState,
    pub blink_detected: bool,
    pub total_blinks: u64,
    pub bpm: usize,
    pub advisories: Vec<Advisory>,
    pub seconds_until_next_advisory: u64,
}

impl FrameReport {
    /// Status line for the overlay, most important message first
    #[must_use]
    pub fn status_text(&self) -> Option<String> {
        if let Some(line) = self.advisories.iter().rev().find_map(Advisory::status_line) {
            return Some(line);
        }
        if self.blink_detected {
            return Some(format!("Blink Detected! Total: {}", self.total_blinks));
        }
        match self.phase {
            Phase::Calibrating { progress_percent } if self.face_detected => {
                Some(format!("Calibrating... {progress_percent}%"))
            }
            _ => None,
        }
    }
}

/// Adaptive closure threshold for the current frame
#[must_use]
pub fn adaptive_threshold(baseline_ear: f64, blink: &BlinkConfig, glasses: bool) -> f64 {
    baseline_ear * blink.adjustment(glasses)
}

/// Blink monitoring session for one subject
pub struct MonitorSession {
    config: Config,
    clock: Box<dyn Clock>,
    glasses_detector: GlassesDetector,
    openness: EyeOpennessCalculator,
    smoother: Box<dyn EarFilter>,
    calibrator: Calibrator,
    fsm: BlinkStateMachine,
    rate: BlinkRateWindow,
    alerts: AlertPolicy,
    notifier: Option<NotificationDispatcher>,
    frames_processed: u64,
    face_frames: u64,
}

impl MonitorSession {
    /// Build a session from a validated configuration.
    ///
    /// The advisory cooldown starts at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config, clock: Box<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let now = clock.now();

        Ok(Self {
            glasses_detector: GlassesDetector::new(config.compensation.glasses_variance_threshold),
            openness: EyeOpennessCalculator::from_config(&config.compensation),
            smoother: config.create_filter()?,
            calibrator: Calibrator::new(config.calibration.frames, config.calibration.baseline_percentile),
            fsm: BlinkStateMachine::new(BlinkLimits::from(&config.blink)),
            rate: BlinkRateWindow::new(config.rate.window_secs),
            alerts: AlertPolicy::from_config(&config.alerts, now),
            notifier: None,
            frames_processed: 0,
            face_frames: 0,
            clock,
            config,
        })
    }

    /// Attach a dispatcher; advisories are forwarded to it as they are emitted
    #[must_use]
    pub fn with_notifier(mut self, notifier: NotificationDispatcher) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Emit the startup advisory and restart the advisory cooldown at the
    /// clock's current time
    pub fn start(&mut self) -> Advisory {
        self.alerts.restart(self.clock.now());
        let advisory = Advisory::started();
        self.deliver(&advisory);
        advisory
    }

    /// Run the pipeline for one frame. `None` means no face in this frame.
    pub fn process_frame(&mut self, face: Option<&LandmarkSet>) -> FrameReport {
        let now = self.clock.now();
        self.frames_processed += 1;

        let mut report = FrameReport {
            timestamp: now,
            face_detected: face.is_some(),
            rotation: None,
            glasses_detected: false,
            ear: None,
            sample: None,
            phase: self.phase(),
            calibration: None,
            transition: None,
            blink_state: self.fsm.state(),
            blink_detected: false,
            total_blinks: self.fsm.total_blinks(),
            bpm: 0,
            advisories: Vec::new(),
            seconds_until_next_advisory: 0,
        };

        if let Some(landmarks) = face {
            self.face_frames += 1;
            self.process_face(landmarks, now, &mut report);
        }

        report.bpm = self.rate.blinks_per_minute(now);
        if let Some(advisory) = self.alerts.evaluate(now, report.bpm) {
            report.advisories.push(advisory);
        }
        report.seconds_until_next_advisory = self.alerts.seconds_until_next(now);

        for advisory in &report.advisories {
            self.deliver(advisory);
        }
        report
    }

    fn process_face(&mut self, landmarks: &LandmarkSet, now: f64, report: &mut FrameReport) {
        let rotation = estimate_head_rotation(landmarks);
        let glasses = self.glasses_detector.detect(landmarks);
        let ear = self.openness.measure(landmarks, &rotation, glasses);
        let smoothed = self.smoother.apply(ear.average);

        report.rotation = Some(rotation);
        report.glasses_detected = glasses;
        report.ear = Some(ear);

        let Some(baseline) = self.calibrator.baseline_ear() else {
            match self.calibrator.observe(smoothed) {
                CalibrationStep::Completed(result) => {
                    report.calibration = Some(result);
                    report.advisories.push(Advisory::calibration_complete());
                }
                CalibrationStep::Collecting { .. } | CalibrationStep::AlreadyCalibrated => {}
            }
            report.phase = self.phase();
            report.sample = Some(EyeSample {
                raw_ear: ear.average,
                smoothed_ear: smoothed,
                is_closed: None,
                threshold: None,
            });
            return;
        };

        let threshold = adaptive_threshold(baseline, &self.config.blink, glasses);
        let is_closed = smoothed < threshold;
        let transition = self.fsm.update(is_closed);
        if transition.blink_detected {
            self.rate.record(now);
            debug!("Blink at {now:.3}s, total {}", self.fsm.total_blinks());
        }

        report.sample = Some(EyeSample {
            raw_ear: ear.average,
            smoothed_ear: smoothed,
            is_closed: Some(is_closed),
            threshold: Some(threshold),
        });
        report.transition = Some(transition);
        report.blink_state = transition.to;
        report.blink_detected = transition.blink_detected;
        report.total_blinks = self.fsm.total_blinks();
    }

    /// Emit the final advisory and stop the delivery worker
    pub fn finish(mut self) -> Advisory {
        let advisory = Advisory::stopped();
        match &self.notifier {
            Some(notifier) => {
                notifier.dispatch_blocking(advisory.clone());
            }
            None => info!("Advisory: {advisory}"),
        }
        info!(
            "Session finished: {} frames, {} with a face, {} blinks",
            self.frames_processed,
            self.face_frames,
            self.fsm.total_blinks()
        );
        if let Some(notifier) = self.notifier.take() {
            let stats = notifier.shutdown();
            info!(
                "Notifications delivered: {}, failed: {}, dropped: {}",
                stats.delivered, stats.failed, stats.dropped
            );
        }
        advisory
    }

    fn deliver(&self, advisory: &Advisory) {
        match &self.notifier {
            Some(notifier) => {
                notifier.dispatch(advisory.clone());
            }
            None => info!("Advisory: {advisory}"),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.calibrator.is_calibrated() {
            Phase::Tracking
        } else {
            Phase::Calibrating {
                progress_percent: self.calibrator.progress_percent(),
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    #[must_use]
    pub fn blink_state_machine(&self) -> &BlinkStateMachine {
        &self.fsm
    }

    #[must_use]
    pub fn rate_window(&self) -> &BlinkRateWindow {
        &self.rate
    }

    #[must_use]
    pub fn alert_policy(&self) -> &AlertPolicy {
        &self.alerts
    }

    #[must_use]
    pub fn last_smoothed_ear(&self) -> Option<f64> {
        self.smoother.last()
    }

    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    #[must_use]
    pub fn face_frames(&self) -> u64 {
        self.face_frames
    }
}
