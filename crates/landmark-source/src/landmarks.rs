//! Facial landmark types

use crate::LandmarkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 2D landmark coordinate (normalized or pixel space)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Which eye a landmark set belongs to, as labelled by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeSide {
    Left,
    Right,
}

impl fmt::Display for EyeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeSide::Left => f.write_str("left"),
            EyeSide::Right => f.write_str("right"),
        }
    }
}

/// Six validated landmarks of one eye.
///
/// Order is fixed by the detector convention:
/// `[outer_corner, upper_lid_1, upper_lid_2, inner_corner, lower_lid_2, lower_lid_1]`.
/// `upper_lid_1` faces `lower_lid_1` and `upper_lid_2` faces `lower_lid_2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarkSet {
    points: [Point2D; EyeLandmarkSet::LEN],
}

impl EyeLandmarkSet {
    /// Number of landmarks per eye
    pub const LEN: usize = 6;

    pub const OUTER_CORNER: usize = 0;
    pub const UPPER_LID_1: usize = 1;
    pub const UPPER_LID_2: usize = 2;
    pub const INNER_CORNER: usize = 3;
    pub const LOWER_LID_2: usize = 4;
    pub const LOWER_LID_1: usize = 5;

    /// Build a set, rejecting non-finite coordinates
    pub fn new(points: [Point2D; Self::LEN]) -> Result<Self, LandmarkError> {
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(LandmarkError::NonFinite {
                index,
                x: p.x,
                y: p.y,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D; Self::LEN] {
        &self.points
    }

    pub fn outer_corner(&self) -> Point2D {
        self.points[Self::OUTER_CORNER]
    }

    pub fn inner_corner(&self) -> Point2D {
        self.points[Self::INNER_CORNER]
    }

    /// Apply a coordinate transform to every point
    pub fn map(&self, f: impl Fn(Point2D) -> Point2D) -> Result<Self, LandmarkError> {
        Self::new(self.points.map(f))
    }
}

impl std::ops::Index<usize> for EyeLandmarkSet {
    type Output = Point2D;

    fn index(&self, index: usize) -> &Point2D {
        &self.points[index]
    }
}

impl TryFrom<&[Point2D]> for EyeLandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: &[Point2D]) -> Result<Self, Self::Error> {
        let points: [Point2D; Self::LEN] =
            points.try_into().map_err(|_| LandmarkError::PointCount {
                expected: Self::LEN,
                actual: points.len(),
            })?;
        Self::new(points)
    }
}

/// An eye failed validation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{side} eye landmarks rejected: {reason}")]
pub struct CorruptLandmarks {
    pub side: EyeSide,
    #[source]
    pub reason: LandmarkError,
}

/// Raw per-face detector output, before validation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left: Vec<Point2D>,
    pub right: Vec<Point2D>,
}

impl FaceLandmarks {
    pub fn new(left: Vec<Point2D>, right: Vec<Point2D>) -> Self {
        Self { left, right }
    }

    /// Validate both eyes
    pub fn eyes(&self) -> Result<(EyeLandmarkSet, EyeLandmarkSet), CorruptLandmarks> {
        let left = EyeLandmarkSet::try_from(self.left.as_slice()).map_err(|reason| {
            CorruptLandmarks {
                side: EyeSide::Left,
                reason,
            }
        })?;
        let right = EyeLandmarkSet::try_from(self.right.as_slice()).map_err(|reason| {
            CorruptLandmarks {
                side: EyeSide::Right,
                reason,
            }
        })?;
        Ok((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.3, 0.1),
            Point2D::new(0.6, 0.1),
            Point2D::new(0.9, 0.0),
            Point2D::new(0.6, -0.1),
            Point2D::new(0.3, -0.1),
        ]
    }

    #[test]
    fn test_valid_eye() {
        let set = EyeLandmarkSet::try_from(eye().as_slice()).unwrap();
        assert_eq!(set.outer_corner(), Point2D::new(0.0, 0.0));
        assert_eq!(set.inner_corner(), Point2D::new(0.9, 0.0));
        assert_eq!(set[EyeLandmarkSet::LOWER_LID_1], Point2D::new(0.3, -0.1));
    }

    #[test]
    fn test_too_few_points() {
        let points = &eye()[..5];
        assert_eq!(
            EyeLandmarkSet::try_from(points),
            Err(LandmarkError::PointCount {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_too_many_points() {
        let mut points = eye();
        points.push(Point2D::new(1.0, 1.0));
        assert!(matches!(
            EyeLandmarkSet::try_from(points.as_slice()),
            Err(LandmarkError::PointCount { actual: 7, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut points = eye();
        points[2].y = f32::NAN;
        assert!(matches!(
            EyeLandmarkSet::try_from(points.as_slice()),
            Err(LandmarkError::NonFinite { index: 2, .. })
        ));

        points[2].y = 0.1;
        points[4].x = f32::INFINITY;
        assert!(matches!(
            EyeLandmarkSet::try_from(points.as_slice()),
            Err(LandmarkError::NonFinite { index: 4, .. })
        ));
    }

    #[test]
    fn test_face_reports_corrupt_side() {
        let face = FaceLandmarks::new(eye(), eye()[..3].to_vec());
        let err = face.eyes().unwrap_err();
        assert_eq!(err.side, EyeSide::Right);
        assert!(err.to_string().starts_with("right eye"));
    }

    #[test]
    fn test_face_json_shape() {
        let face = FaceLandmarks::new(eye(), eye());
        let json = serde_json::to_string(&face).unwrap();
        let parsed: FaceLandmarks = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, face);
        assert!(json.contains("\"left\":[{\"x\":0.0,\"y\":0.0}"));
    }
}
