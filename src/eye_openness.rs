//! Eye aspect ratio (EAR) with head-tilt and eyewear compensation.
//!
//! Uses the classic 6-point formulation on pixel coordinates:
//!
//! ```text
//! EAR = (|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)
//! ```
//!
//! where p1/p4 are the eye corners and p2, p3 / p6, p5 the upper and lower
//! lid points. Lower values mean a more closed eye.

use crate::{
    config::CompensationConfig,
    constants::{EPSILON, FALLBACK_EAR, LEFT_EYE, RIGHT_EYE},
    geometry::HeadRotation,
    landmarks::{LandmarkSet, PixelPoint},
    Error, Result,
};
use log::debug;

/// Uncompensated EAR of one eye from its six points (p1..p6).
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if the corner distance is zero or the
/// result is not finite.
pub fn eye_aspect_ratio(points: &[PixelPoint; 6]) -> Result<f64> {
    let [p1, p2, p3, p4, p5, p6] = points;
    let horizontal = p1.distance(p4);
    if horizontal < EPSILON {
        return Err(Error::DegenerateGeometry("Eye corners coincide".to_string()));
    }

    let ear = (p2.distance(p6) + p3.distance(p5)) / (2.0 * horizontal);
    if !ear.is_finite() {
        return Err(Error::DegenerateGeometry(format!("Non-finite EAR: {ear}")));
    }
    Ok(ear)
}

/// Per-eye and averaged openness for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarMeasurement {
    pub left: f64,
    pub right: f64,
    /// Mean of both eyes, the value fed to smoothing
    pub average: f64,
    /// Number of eyes that fell back to the sentinel value
    pub fallbacks: u8,
}

/// Computes compensated EAR for both eyes
#[derive(Debug, Clone, Copy)]
pub struct EyeOpennessCalculator {
    pitch_gain: f64,
    glasses_scale: f64,
}

impl EyeOpennessCalculator {
    #[must_use]
    pub fn new(pitch_gain: f64, glasses_scale: f64) -> Self {
        Self {
            pitch_gain,
            glasses_scale,
        }
    }

    #[must_use]
    pub fn from_config(config: &CompensationConfig) -> Self {
        Self::new(config.pitch_gain, config.glasses_ear_scale)
    }

    /// Apply pitch compensation, then the eyewear scale
    #[must_use]
    pub fn compensate(&self, ear: f64, rotation: &HeadRotation, glasses: bool) -> f64 {
        let ear = ear * (1.0 + self.pitch_gain * rotation.pitch.abs());
        if glasses {
            ear * self.glasses_scale
        } else {
            ear
        }
    }

    /// Compensated EAR for the eye described by `indices`.
    ///
    /// # Errors
    ///
    /// Returns an error if a landmark is missing or the eye geometry is
    /// degenerate.
    pub fn try_eye(
        &self,
        landmarks: &LandmarkSet,
        indices: &[usize; 6],
        rotation: &HeadRotation,
        glasses: bool,
    ) -> Result<f64> {
        let mut points = [PixelPoint::new(0.0, 0.0); 6];
        for (slot, &index) in points.iter_mut().zip(indices) {
            *slot = landmarks.pixel(index)?;
        }
        let ear = eye_aspect_ratio(&points)?;
        Ok(self.compensate(ear, rotation, glasses))
    }

    /// Compensated EAR for one eye, or the "fully open" sentinel on error
    #[must_use]
    pub fn eye_or_fallback(
        &self,
        landmarks: &LandmarkSet,
        indices: &[usize; 6],
        rotation: &HeadRotation,
        glasses: bool,
    ) -> (f64, bool) {
        match self.try_eye(landmarks, indices, rotation, glasses) {
            Ok(ear) => (ear, false),
            Err(e) => {
                debug!("EAR fallback for eye {:?}: {e}", indices[0]);
                (FALLBACK_EAR, true)
            }
        }
    }

    /// Measure both eyes and average them
    #[must_use]
    pub fn measure(&self, landmarks: &LandmarkSet, rotation: &HeadRotation, glasses: bool) -> EarMeasurement {
        let (left, left_failed) = self.eye_or_fallback(landmarks, &LEFT_EYE, rotation, glasses);
        let (right, right_failed) = self.eye_or_fallback(landmarks, &RIGHT_EYE, rotation, glasses);

        EarMeasurement {
            left,
            right,
            average: (left + right) / 2.0,
            fallbacks: u8::from(left_failed) + u8::from(right_failed),
        }
    }
}
