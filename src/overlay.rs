//! Annotation data for a rendering surface.
//!
//! Purely observational: an [`Overlay`] is derived from a [`FrameReport`]
//! and never feeds back into the pipeline.

use crate::session::FrameReport;
use std::fmt;

/// RGB color
pub type Rgb = [u8; 3];

pub const OPEN_COLOR: Rgb = [0, 255, 0];
pub const CLOSED_COLOR: Rgb = [255, 0, 0];
pub const RATE_COLOR: Rgb = [0, 255, 0];
pub const GLASSES_COLOR: Rgb = [0, 0, 255];
pub const STATUS_COLOR: Rgb = [255, 165, 0];
pub const TEXT_COLOR: Rgb = [255, 255, 255];

/// One line of overlay text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub text: String,
    pub color: Rgb,
}

impl OverlayLine {
    fn new(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Overlay content for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// Color for the eye landmarks, `None` when the eyes were not classified
    pub eye_color: Option<Rgb>,
    pub lines: Vec<OverlayLine>,
}

impl Overlay {
    /// Build overlay text for a frame report
    #[must_use]
    pub fn from_report(report: &FrameReport, show_state: bool) -> Self {
        let mut lines = vec![OverlayLine::new(format!("Blink Rate: {} BPM", report.bpm), RATE_COLOR)];

        if report.glasses_detected {
            lines.push(OverlayLine::new("Glasses Detected", GLASSES_COLOR));
        }
        if let Some(status) = report.status_text() {
            lines.push(OverlayLine::new(status, STATUS_COLOR));
        }

        let mut eye_color = None;
        if let Some(sample) = &report.sample {
            if let (Some(is_closed), Some(threshold)) = (sample.is_closed, sample.threshold) {
                let mut text = format!("EAR: {:.3} / Threshold: {threshold:.3}", sample.smoothed_ear);
                if show_state {
                    if let Some(transition) = &report.transition {
                        text.push_str(&format!(" | State: {transition}"));
                    }
                }
                lines.push(OverlayLine::new(text, TEXT_COLOR));
                eye_color = Some(if is_closed { CLOSED_COLOR } else { OPEN_COLOR });
            }
        }

        if let Some(rotation) = &report.rotation {
            lines.push(OverlayLine::new(rotation.to_string(), TEXT_COLOR));
        }

        let minutes = report.seconds_until_next_advisory / 60;
        let seconds = report.seconds_until_next_advisory % 60;
        lines.push(OverlayLine::new(
            format!("Next notification in: {minutes}m {seconds}s"),
            TEXT_COLOR,
        ));

        Self { eye_color, lines }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts: Vec<&str> = self.lines.iter().map(|line| line.text.as_str()).collect();
        f.write_str(&texts.join(" | "))
    }
}
