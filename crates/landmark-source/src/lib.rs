//! Landmark Input Boundary
//!
//! Everything the drowsiness core knows about the outside world on the
//! inbound side:
//! - Eye landmark types (six points per eye, fixed order)
//! - Camera, detector and resource acquisition traits
//! - Recorded landmark replay (JSON lines) for bench and field playback
//! - Scripted in-memory sources for tests and demos
//! - Eye extraction from a 468-point face mesh

pub mod landmarks;
pub mod mesh;
pub mod replay;
pub mod resources;
pub mod scripted;

pub use landmarks::{CorruptLandmarks, EyeLandmarkSet, EyeSide, FaceLandmarks, Point2D};
pub use replay::{ReplayConfig, ReplayProvider};
pub use resources::{
    FailureCause, LandmarkDetector, Resource, ResourceFailure, ResourceProvider, VideoSource,
};

use thiserror::Error;

/// Landmark validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    PointCount { expected: usize, actual: usize },

    #[error("landmark {index} has non-finite coordinates ({x}, {y})")]
    NonFinite { index: usize, x: f32, y: f32 },

    #[error("face mesh has {actual} points, need at least {expected}")]
    MeshTooShort { expected: usize, actual: usize },
}

/// Video source errors raised while streaming
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Video source reached the end of its stream")]
    Ended,

    #[error("Video source disconnected: {0}")]
    Disconnected(String),
}

/// Per-frame detector errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("Landmark inference failed: {0}")]
    Inference(String),

    #[error("Malformed detector output: {0}")]
    Malformed(String),
}
