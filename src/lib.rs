//! Blink-rate monitoring library.
//!
//! Turns a per-frame stream of facial landmarks into debounced blink events,
//! a blinks-per-minute rate, and periodic wellbeing advisories:
//!
//! 1. Geometry: head rotation and glasses presence from landmark layout
//! 2. Eye openness: compensated eye aspect ratio (EAR)
//! 3. Temporal smoothing of EAR
//! 4. Self-calibration of the "eyes open" baseline
//! 5. A blink state machine rejecting too-short and too-long closures
//! 6. A sliding 60 second rate window
//! 7. A cadence-gated advisory policy with non-blocking delivery
//!
//! Landmark detection and video capture are external: anything implementing
//! [`landmarks::LandmarkProvider`] can drive the pipeline.
//!
//! # Examples
//!
//! ## Processing Frames
//!
//! ```no_run
//! use blink_monitor::{clock::SystemClock, config::Config, session::MonitorSession};
//! use blink_monitor::landmarks::LandmarkProvider;
//! use blink_monitor::replay::ReplayProvider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut provider = ReplayProvider::open("recording.jsonl")?;
//! let mut session = MonitorSession::new(Config::default(), Box::new(SystemClock::new()))?;
//!
//! while let Some(frame) = provider.next_frame()? {
//!     let report = session.process_frame(frame.face.as_ref());
//!     if report.blink_detected {
//!         println!("Blink! {} BPM", report.bpm);
//!     }
//! }
//! session.finish();
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the State Machine Directly
//!
//! ```
//! use blink_monitor::blink_fsm::BlinkStateMachine;
//!
//! let mut fsm = BlinkStateMachine::default();
//! let closed = [false, true, true, false, false];
//! let blinks = closed.iter().filter(|&&c| fsm.update(c).blink_detected).count();
//! assert_eq!(blinks, 1);
//! ```

/// Alert policy and advisory texts
pub mod alerts;

/// Main application module
pub mod app;

/// Blink detection state machine
pub mod blink_fsm;

/// Baseline EAR calibration
pub mod calibration;

/// Injectable time source
pub mod clock;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Error types and result handling
pub mod error;

/// Eye aspect ratio computation
pub mod eye_openness;

/// Temporal smoothing filters for EAR samples
pub mod filters;

/// Head rotation and glasses estimation
pub mod geometry;

/// Landmark types and the provider contract
pub mod landmarks;

/// Non-blocking advisory delivery
pub mod notification;

/// Overlay annotation data
pub mod overlay;

/// Blink rate sliding window
pub mod rate;

/// Recorded landmark streams
pub mod replay;

/// Per-frame monitoring pipeline
pub mod session;

pub use error::{Error, Result};
