//! Camera and detector collaborator traits

use crate::{DetectorError, FaceLandmarks, SourceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::io;
use thiserror::Error;

/// Resources a monitoring session needs before it can go active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    VideoSource,
    LandmarkDetector,
}

/// Classification of a resource failure, shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Camera access was refused
    PermissionDenied,
    /// No camera (or recording) available
    DeviceNotFound,
    /// Landmark detection service failed to initialize
    DetectorInit,
    /// Video stream broke while a session was active
    SourceInterrupted,
}

impl FailureCause {
    /// Human readable explanation
    pub fn message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Camera access was denied",
            Self::DeviceNotFound => "No camera was found",
            Self::DetectorInit => "Face landmark detection failed to start",
            Self::SourceInterrupted => "The camera stream was interrupted",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Resource acquisition failure with its cause
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{cause} ({detail})")]
pub struct ResourceFailure {
    pub cause: FailureCause,
    pub detail: String,
}

impl ResourceFailure {
    pub fn new(cause: FailureCause, detail: impl Into<String>) -> Self {
        Self {
            cause,
            detail: detail.into(),
        }
    }

    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self::new(FailureCause::PermissionDenied, detail)
    }

    pub fn device_not_found(detail: impl Into<String>) -> Self {
        Self::new(FailureCause::DeviceNotFound, detail)
    }

    pub fn detector_init(detail: impl Into<String>) -> Self {
        Self::new(FailureCause::DetectorInit, detail)
    }

    pub fn interrupted(detail: impl Into<String>) -> Self {
        Self::new(FailureCause::SourceInterrupted, detail)
    }

    /// Map an I/O error from opening a video device
    pub fn from_io(device: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                Self::permission_denied(format!("{}: {}", device, err))
            }
            _ => Self::device_not_found(format!("{}: {}", device, err)),
        }
    }
}

/// Producer of video frames (camera device, recording, ...).
///
/// Frames are opaque to the core; they are only handed to the detector.
pub trait VideoSource: Send {
    type Frame: Send + Sync;

    /// Wait for the next frame.
    ///
    /// Must be cancel-safe: dropping the future before it resolves must not
    /// lose a frame or leave the source in a torn state.
    fn next_frame(&mut self) -> impl Future<Output = Result<Self::Frame, SourceError>> + Send;

    /// Release the device
    fn release(&mut self) {}
}

/// Opaque landmark detection service.
///
/// Not assumed safe for concurrent invocation; callers hold `&mut self`.
pub trait LandmarkDetector<F: Sync>: Send {
    /// Detect the eyes of the driver, `None` when no face is visible
    fn detect(
        &mut self,
        frame: &F,
    ) -> impl Future<Output = Result<Option<FaceLandmarks>, DetectorError>> + Send;

    /// Release the detector handle
    fn release(&mut self) {}
}

/// Acquires the camera and detector for a monitoring session
pub trait ResourceProvider: Send {
    type Video: VideoSource;
    type Detector: LandmarkDetector<<Self::Video as VideoSource>::Frame>;

    fn open_video(&mut self) -> impl Future<Output = Result<Self::Video, ResourceFailure>> + Send;

    fn load_detector(
        &mut self,
    ) -> impl Future<Output = Result<Self::Detector, ResourceFailure>> + Send;
}
