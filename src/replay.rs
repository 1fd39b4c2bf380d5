//! Recorded landmark streams.
//!
//! A replay file holds one JSON object per line:
//!
//! ```text
//! {"timestamp": 0.033, "width": 640, "height": 480, "landmarks": [[0.41, 0.38, -0.02], ...]}
//! {"timestamp": 0.066, "width": 640, "height": 480, "landmarks": null}
//! ```
//!
//! `landmarks: null` (or a missing field) marks a frame without a face.
//! `timestamp` is optional.

use crate::{
    landmarks::{FrameInput, Landmark, LandmarkProvider, LandmarkSet},
    Error, Result,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Serialized form of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 3]>>,
}

impl RecordedFrame {
    /// Convert into pipeline input.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is present but the frame size is zero.
    pub fn into_frame_input(self) -> Result<FrameInput> {
        let face = match self.landmarks {
            Some(points) => {
                let points = points.into_iter().map(|[x, y, z]| Landmark::new(x, y, z)).collect();
                Some(LandmarkSet::new(points, self.width, self.height)?)
            }
            None => None,
        };
        Ok(FrameInput {
            timestamp: self.timestamp,
            face,
        })
    }
}

/// Landmark provider reading a JSON Lines recording
pub struct ReplayProvider<R> {
    reader: R,
    line_number: usize,
    buffer: String,
    name: String,
}

impl ReplayProvider<BufReader<File>> {
    /// Open a recording on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening landmark recording: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> ReplayProvider<R> {
    pub fn from_reader(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> LandmarkProvider for ReplayProvider<R> {
    fn next_frame(&mut self) -> Result<Option<FrameInput>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }

            let frame: RecordedFrame = serde_json::from_str(line)
                .map_err(|e| Error::ReplayFormat(format!("line {}: {e}", self.line_number)))?;
            return frame
                .into_frame_input()
                .map(Some)
                .map_err(|e| Error::ReplayFormat(format!("line {}: {e}", self.line_number)));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Write frames in the replay format
pub fn write_recording<W: Write>(mut writer: W, frames: &[RecordedFrame]) -> Result<()> {
    for frame in frames {
        let line = serde_json::to_string(frame).map_err(|e| Error::ReplayFormat(e.to_string()))?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}
