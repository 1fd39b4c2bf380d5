//! Head rotation and eyewear estimation from landmark geometry.
//!
//! Both estimators run on every frame with a face. Failures are returned as
//! errors from the `try_*` functions and mapped to fixed fallbacks by the
//! public entry points, so geometry never aborts a frame.

use crate::{
    constants::{CHIN, FOREHEAD, LEFT_EAR, LEFT_EYE_CONTOUR, RIGHT_EAR, RIGHT_EYE_CONTOUR},
    landmarks::LandmarkSet,
    Error, Result,
};
use log::debug;
use std::fmt;

/// Approximate head rotation derived from a handful of landmarks.
///
/// Values are in normalized image units except `roll`, which is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadRotation {
    /// Vertical forehead-to-chin displacement
    pub pitch: f64,
    /// Horizontal ear-to-ear displacement, positive when turned to the camera's right
    pub yaw: f64,
    /// Ear-to-ear tilt angle
    pub roll: f64,
}

impl fmt::Display for HeadRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pitch: {:.2}, Yaw: {:.2}", self.pitch, self.yaw)
    }
}

/// Compute head rotation, propagating landmark errors.
///
/// # Errors
///
/// Returns an error if an ear, forehead or chin landmark is missing or invalid.
pub fn try_head_rotation(landmarks: &LandmarkSet) -> Result<HeadRotation> {
    let left_ear = landmarks.get(LEFT_EAR)?;
    let right_ear = landmarks.get(RIGHT_EAR)?;
    let forehead = landmarks.get(FOREHEAD)?;
    let chin = landmarks.get(CHIN)?;

    let dx = right_ear.x - left_ear.x;
    let dy = right_ear.y - left_ear.y;
    let roll = if dx == 0.0 { 0.0 } else { dy.atan2(dx) };

    Ok(HeadRotation {
        pitch: forehead.y - chin.y,
        yaw: dx,
        roll,
    })
}

/// Head rotation with the `{0, 0, 0}` fallback on any landmark problem
#[must_use]
pub fn estimate_head_rotation(landmarks: &LandmarkSet) -> HeadRotation {
    try_head_rotation(landmarks).unwrap_or_else(|e| {
        debug!("Head rotation fallback: {e}");
        HeadRotation::default()
    })
}

/// Population variance of the distances between consecutive contour points.
///
/// The ring is not closed: a 16-point contour yields 15 distances.
///
/// # Errors
///
/// Returns an error if a contour landmark is missing or fewer than two points
/// are given.
pub fn contour_distance_variance(landmarks: &LandmarkSet, contour: &[usize]) -> Result<f64> {
    let points = landmarks.pixels(contour)?;
    if points.len() < 2 {
        return Err(Error::DegenerateGeometry(format!(
            "Contour needs at least 2 points, got {}",
            points.len()
        )));
    }

    let distances: Vec<f64> = points.windows(2).map(|pair| pair[0].distance(&pair[1])).collect();
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    Ok(distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n)
}

/// Eyewear detector based on contour irregularity.
///
/// Glasses frames tend to break up the detected eye contour, which shows up
/// as uneven spacing between consecutive contour points.
#[derive(Debug, Clone, Copy)]
pub struct GlassesDetector {
    variance_threshold: f64,
}

impl GlassesDetector {
    #[must_use]
    pub fn new(variance_threshold: f64) -> Self {
        Self { variance_threshold }
    }

    /// Whether one eye's contour looks interrupted. Errors count as no glasses.
    #[must_use]
    pub fn eye_has_glasses(&self, landmarks: &LandmarkSet, contour: &[usize]) -> bool {
        match contour_distance_variance(landmarks, contour) {
            Ok(variance) => variance > self.variance_threshold,
            Err(e) => {
                debug!("Glasses check fallback: {e}");
                false
            }
        }
    }

    /// Per-frame glasses presence, OR'd over both eyes
    #[must_use]
    pub fn detect(&self, landmarks: &LandmarkSet) -> bool {
        self.eye_has_glasses(landmarks, &LEFT_EYE_CONTOUR) || self.eye_has_glasses(landmarks, &RIGHT_EYE_CONTOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::NUM_FACE_MESH_LANDMARKS, landmarks::Landmark};

    fn face_with(overrides: &[(usize, Landmark)]) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); NUM_FACE_MESH_LANDMARKS];
        for &(i, lm) in overrides {
            points[i] = lm;
        }
        LandmarkSet::new(points, 64, 64).unwrap()
    }

    #[test]
    fn test_head_rotation_components() {
        let face = face_with(&[
            (LEFT_EAR, Landmark::new(0.3, 0.5, 0.0)),
            (RIGHT_EAR, Landmark::new(0.7, 0.6, 0.0)),
            (FOREHEAD, Landmark::new(0.5, 0.2, 0.0)),
            (CHIN, Landmark::new(0.5, 0.8, 0.0)),
        ]);
        let rotation = estimate_head_rotation(&face);
        assert!((rotation.yaw - 0.4).abs() < 1e-12);
        assert!((rotation.pitch + 0.6).abs() < 1e-12);
        assert!((rotation.roll - 0.1_f64.atan2(0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_roll_zero_when_ears_aligned_vertically() {
        let face = face_with(&[
            (LEFT_EAR, Landmark::new(0.5, 0.4, 0.0)),
            (RIGHT_EAR, Landmark::new(0.5, 0.6, 0.0)),
        ]);
        let rotation = estimate_head_rotation(&face);
        assert_eq!(rotation.roll, 0.0);
        assert_eq!(rotation.yaw, 0.0);
    }

    #[test]
    fn test_rotation_fallback_on_missing_landmarks() {
        let face = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0); 20], 100, 100).unwrap();
        assert!(try_head_rotation(&face).is_err());
        assert_eq!(estimate_head_rotation(&face), HeadRotation::default());
    }

    #[test]
    fn test_uniform_contour_has_zero_variance() {
        let overrides: Vec<(usize, Landmark)> = LEFT_EYE_CONTOUR
            .iter()
            .enumerate()
            .map(|(k, &i)| (i, Landmark::new(k as f64 / 64.0, 0.5, 0.0)))
            .collect();
        let face = face_with(&overrides);
        let variance = contour_distance_variance(&face, &LEFT_EYE_CONTOUR).unwrap();
        assert!(variance.abs() < 1e-9);
    }

    #[test]
    fn test_irregular_contour_triggers_glasses() {
        // Alternate 1 px and 30 px steps: eight 1 px and seven 30 px distances, variance ~209
        let mut x = 0.0;
        let overrides: Vec<(usize, Landmark)> = RIGHT_EYE_CONTOUR
            .iter()
            .enumerate()
            .map(|(k, &i)| {
                let lm = Landmark::new(x / 1024.0, 0.5, 0.0);
                x += if k % 2 == 0 { 1.0 } else { 30.0 };
                (i, lm)
            })
            .collect();
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); NUM_FACE_MESH_LANDMARKS];
        for (i, lm) in overrides {
            points[i] = lm;
        }
        let face = LandmarkSet::new(points, 1024, 1024).unwrap();

        let detector = GlassesDetector::new(60.0);
        assert!(detector.eye_has_glasses(&face, &RIGHT_EYE_CONTOUR));
        assert!(detector.detect(&face));
    }

    #[test]
    fn test_glasses_false_on_missing_contour() {
        let face = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0); 10], 100, 100).unwrap();
        assert!(!GlassesDetector::new(60.0).detect(&face));
    }
}
