//! Eye Aspect Ratio (EAR)
//!
//! Ratio of the two vertical lid distances to the corner-to-corner width.
//! Roughly 0.25-0.35 for an open eye, falling towards 0 as the lids close.
//! The threshold constants in `DmsConfig` assume exactly this formula.

use crate::geometry::distance;
use crate::DmsError;
use landmark_source::EyeLandmarkSet;
use serde::{Deserialize, Serialize};

/// EAR of a single eye
pub fn compute_ear(eye: &EyeLandmarkSet) -> Result<f32, DmsError> {
    let vertical_1 = distance(
        eye[EyeLandmarkSet::UPPER_LID_1],
        eye[EyeLandmarkSet::LOWER_LID_1],
    );
    let vertical_2 = distance(
        eye[EyeLandmarkSet::UPPER_LID_2],
        eye[EyeLandmarkSet::LOWER_LID_2],
    );
    let horizontal = distance(eye.outer_corner(), eye.inner_corner());

    if horizontal == 0.0 {
        return Err(DmsError::DegenerateGeometry);
    }

    let ear = (vertical_1 + vertical_2) / (2.0 * horizontal);
    // Subnormal widths can still overflow.
    if !ear.is_finite() {
        return Err(DmsError::DegenerateGeometry);
    }
    Ok(ear)
}

/// Mean EAR of both eyes; fails if either eye is degenerate
pub fn compute_average_ear(left: &EyeLandmarkSet, right: &EyeLandmarkSet) -> Result<f32, DmsError> {
    EarReading::from_eyes(left, right).map(|reading| reading.average)
}

/// Per-eye and averaged EAR for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarReading {
    pub left: f32,
    pub right: f32,
    pub average: f32,
}

impl EarReading {
    pub fn from_eyes(left: &EyeLandmarkSet, right: &EyeLandmarkSet) -> Result<Self, DmsError> {
        let left = compute_ear(left)?;
        let right = compute_ear(right)?;
        Ok(Self {
            left,
            right,
            average: (left + right) / 2.0,
        })
    }
}
