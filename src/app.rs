//! Main application module for the blink monitor.

use crate::{
    clock::{Clock, ManualClock, SystemClock},
    config::Config,
    error::Result,
    landmarks::{FrameInput, LandmarkProvider},
    notification::{create_sink, NotificationDispatcher, NotificationSink},
    overlay::Overlay,
    session::MonitorSession,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Where session time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Wall clock while the loop runs
    System,
    /// Timestamps recorded with each frame
    Frame,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Pipeline configuration
    pub monitor: Config,
    /// Notification sink name, overriding the configured one
    pub sink: Option<String>,
    /// Time source for the session
    pub clock_source: ClockSource,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

/// Summary returned when the loop ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub face_frames: u64,
    pub total_blinks: u64,
    pub final_bpm: usize,
    pub calibrated: bool,
}

/// Main application struct
pub struct BlinkMonitorApp<P: LandmarkProvider> {
    config: AppConfig,
    provider: P,
    session: MonitorSession,
    frame_clock: Option<ManualClock>,
}

impl<P: LandmarkProvider> BlinkMonitorApp<P> {
    /// Create a new blink monitor application
    pub fn new(config: AppConfig, provider: P) -> Result<Self> {
        let sink_name = config.sink.clone().unwrap_or_else(|| config.monitor.alerts.sink.clone());
        let sink = create_sink(&sink_name, &config.monitor.alerts)?;
        Self::with_sink(config, provider, sink)
    }

    /// Create an application delivering advisories to an explicit sink
    pub fn with_sink(config: AppConfig, provider: P, sink: Box<dyn NotificationSink>) -> Result<Self> {
        info!("Initializing Blink Monitor with {} provider", provider.name());

        let (clock, frame_clock): (Box<dyn Clock>, Option<ManualClock>) = match config.clock_source {
            ClockSource::System => (Box::new(SystemClock::new()), None),
            ClockSource::Frame => {
                info!("Using recorded frame timestamps as session time");
                let clock = ManualClock::new(0.0);
                (Box::new(clock.clone()), Some(clock))
            }
        };

        let dispatcher = NotificationDispatcher::spawn(sink, config.monitor.alerts.queue_capacity)?;

        let session = MonitorSession::new(config.monitor.clone(), clock)?.with_notifier(dispatcher);

        Ok(Self {
            config,
            provider,
            session,
            frame_clock,
        })
    }

    /// Run the main application loop until the stream ends.
    ///
    /// The session is always finished, so the stop advisory is delivered
    /// even when the provider fails.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after the session has been finished.
    pub fn run(mut self) -> Result<RunSummary> {
        info!("Starting main application loop");

        // Session time starts at the first recorded timestamp
        let mut pending = Some(self.provider.next_frame());
        if let (Some(clock), Some(Ok(Some(FrameInput {
            timestamp: Some(timestamp),
            ..
        })))) = (&self.frame_clock, &pending)
        {
            clock.set(*timestamp);
        }
        self.session.start();

        let mut frame_count: u64 = 0;
        let mut last_bpm = 0;
        let mut failure = None;
        let start_time = Instant::now();
        let mut last_fps_update = Instant::now();
        let log_every = self.config.monitor.display.log_every_frames;
        let show_state = self.config.monitor.display.show_state;

        loop {
            let next = match pending.take() {
                Some(next) => next,
                None => self.provider.next_frame(),
            };
            let frame = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of landmark stream after {frame_count} frames");
                    break;
                }
                Err(e) => {
                    warn!("Landmark provider failed after {frame_count} frames: {e}");
                    failure = Some(e);
                    break;
                }
            };

            if let Some(clock) = &self.frame_clock {
                match frame.timestamp {
                    Some(timestamp) => clock.set(timestamp),
                    None => warn!("Frame {frame_count} has no timestamp, keeping previous time"),
                }
            }

            let report = self.session.process_frame(frame.face.as_ref());
            frame_count += 1;
            last_bpm = report.bpm;

            if let Some(result) = report.calibration {
                info!(
                    "Baseline EAR {:.4} (std dev {:.4}) from {} frames",
                    result.baseline_ear, result.std_dev, result.samples
                );
            }
            if report.blink_detected {
                debug!("Blink Detected! Total: {}", report.total_blinks);
            }
            if log_every > 0 && frame_count % log_every == 0 {
                debug!("{}", Overlay::from_report(&report, show_state));
            }

            if last_fps_update.elapsed() >= Duration::from_secs(1) {
                #[allow(clippy::cast_precision_loss)]
                let fps = frame_count as f64 / start_time.elapsed().as_secs_f64();
                debug!("Processing at {fps:.1} fps");
                last_fps_update = Instant::now();
            }

            if self.config.max_frames.is_some_and(|max| frame_count >= max) {
                info!("Frame limit reached");
                break;
            }
        }

        let summary = RunSummary {
            frames: frame_count,
            face_frames: self.session.face_frames(),
            total_blinks: self.session.blink_state_machine().total_blinks(),
            final_bpm: last_bpm,
            calibrated: self.session.calibrator().is_calibrated(),
        };

        info!("Application shutting down");
        self.session.finish();
        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}
