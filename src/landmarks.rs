//! Facial landmark types and the provider contract.
//!
//! Landmark detection itself happens outside this crate. A provider hands the
//! pipeline one [`FrameInput`] per video frame, holding either a complete
//! [`LandmarkSet`] or nothing when no face was found.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single normalized landmark.
///
/// `x` and `y` are fractions of the frame width and height, `z` is the
/// detector's normalized depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A landmark projected into pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// All landmarks of one detected face in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
    frame_width: u32,
    frame_height: u32,
}

impl LandmarkSet {
    /// Create a landmark set for a frame of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if either frame dimension is zero.
    pub fn new(points: Vec<Landmark>, frame_width: u32, frame_height: u32) -> Result<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidInput(format!(
                "Frame dimensions must be positive, got {frame_width}x{frame_height}"
            )));
        }
        Ok(Self {
            points,
            frame_width,
            frame_height,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Normalized landmark at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingLandmark`] if the index is out of range and
    /// [`Error::InvalidLandmark`] if the coordinates are not finite.
    pub fn get(&self, index: usize) -> Result<Landmark> {
        let landmark = self.points.get(index).copied().ok_or(Error::MissingLandmark(index))?;
        if !landmark.is_finite() {
            return Err(Error::InvalidLandmark(index));
        }
        Ok(landmark)
    }

    /// Pixel position of the landmark at `index`, truncated to whole pixels.
    ///
    /// # Errors
    ///
    /// Same as [`LandmarkSet::get`].
    pub fn pixel(&self, index: usize) -> Result<PixelPoint> {
        let landmark = self.get(index)?;
        Ok(PixelPoint::new(
            (landmark.x * f64::from(self.frame_width)).trunc(),
            (landmark.y * f64::from(self.frame_height)).trunc(),
        ))
    }

    /// Pixel positions for a list of indices, failing on the first bad one.
    ///
    /// # Errors
    ///
    /// Same as [`LandmarkSet::get`].
    pub fn pixels(&self, indices: &[usize]) -> Result<Vec<PixelPoint>> {
        indices.iter().map(|&i| self.pixel(i)).collect()
    }
}

/// One frame as delivered by a landmark provider
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    /// Capture time in seconds, when the source records one
    pub timestamp: Option<f64>,
    /// Detected face, or `None` when the frame has no face
    pub face: Option<LandmarkSet>,
}

impl FrameInput {
    #[must_use]
    pub fn with_face(face: LandmarkSet) -> Self {
        Self {
            timestamp: None,
            face: Some(face),
        }
    }

    #[must_use]
    pub fn no_face() -> Self {
        Self {
            timestamp: None,
            face: None,
        }
    }
}

/// Source of per-frame landmarks.
///
/// Combines the frame source and the landmark detector: each call blocks
/// until the next frame is available.
pub trait LandmarkProvider {
    /// Next frame, or `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying source fails irrecoverably.
    fn next_frame(&mut self) -> Result<Option<FrameInput>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> LandmarkSet {
        let points = vec![
            Landmark::new(0.5, 0.25, 0.0),
            Landmark::new(0.101, 0.999, -0.02),
            Landmark::new(f64::NAN, 0.5, 0.0),
        ];
        LandmarkSet::new(points, 640, 480).unwrap()
    }

    #[test]
    fn test_pixel_conversion_truncates() {
        let set = sample_set();
        assert_eq!(set.pixel(0).unwrap(), PixelPoint::new(320.0, 120.0));
        // 0.101 * 640 = 64.64, 0.999 * 480 = 479.52
        assert_eq!(set.pixel(1).unwrap(), PixelPoint::new(64.0, 479.0));
    }

    #[test]
    fn test_missing_and_invalid_landmarks() {
        let set = sample_set();
        assert!(matches!(set.get(3), Err(Error::MissingLandmark(3))));
        assert!(matches!(set.get(2), Err(Error::InvalidLandmark(2))));
        assert!(set.pixels(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_zero_frame_size_rejected() {
        assert!(LandmarkSet::new(Vec::new(), 0, 480).is_err());
        assert!(LandmarkSet::new(Vec::new(), 640, 0).is_err());
    }

    #[test]
    fn test_pixel_distance() {
        let a = PixelPoint::new(0.0, 0.0);
        let b = PixelPoint::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }
}
