//! DMS per-frame analysis results

use crate::debounce::AlertVerdict;
use crate::ear::EarReading;
use serde::{Deserialize, Serialize};

/// Why a frame did not reach the debounce filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Detector saw no face this frame
    NoFace,

    /// Eye corners coincide
    DegenerateGeometry,

    /// Detector handed over malformed eye landmarks
    CorruptLandmarks,

    /// Detector call itself failed
    DetectorFault,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoFace => "no_face",
            SkipReason::DegenerateGeometry => "degenerate_geometry",
            SkipReason::CorruptLandmarks => "corrupt_landmarks",
            SkipReason::DetectorFault => "detector_fault",
        }
    }
}

/// Outcome of one processed frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    /// EAR values (evaluated frames only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<EarReading>,

    /// Verdict after this frame (unchanged on skipped frames)
    pub verdict: AlertVerdict,

    /// Run counter after this frame
    pub consecutive_low_frames: u32,

    /// Set when the frame was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl DmsAnalysis {
    /// Whether the frame reached the debounce filter
    pub fn is_evaluated(&self) -> bool {
        self.skipped.is_none()
    }

    pub fn is_drowsy(&self) -> bool {
        self.verdict.is_drowsy()
    }
}
