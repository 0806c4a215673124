//! DMS configuration

use crate::DmsError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Average EAR below which a frame counts as eyes closed
    pub ear_threshold: f32,

    /// Onset needs strictly more than this many consecutive closed frames
    pub required_consecutive_frames: u32,

    /// Frame rate `required_consecutive_frames` is calibrated for
    pub nominal_fps: f32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.22,
            required_consecutive_frames: 15, // ~0.5s at 30fps
            nominal_fps: 30.0,
        }
    }
}

impl DmsConfig {
    /// Create strict config (faster onset)
    pub fn strict() -> Self {
        Self {
            required_consecutive_frames: 9,
            ..Default::default()
        }
    }

    /// Create lenient config (slower onset, lower threshold)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.20,
            required_consecutive_frames: 30,
            ..Default::default()
        }
    }

    /// Rescale the frame requirement to another camera rate, keeping the
    /// same onset latency
    pub fn for_frame_rate(&self, fps: f32) -> Result<Self, DmsError> {
        self.validate()?;
        let frames = self.required_consecutive_frames as f32 * fps / self.nominal_fps;
        let rescaled = Self {
            required_consecutive_frames: frames.round().max(0.0) as u32,
            nominal_fps: fps,
            ..self.clone()
        };
        rescaled.validate()?;
        Ok(rescaled)
    }

    /// Sustained closure needed before onset at the nominal rate.
    /// `Duration::MAX` for a config that does not validate.
    pub fn onset_latency(&self) -> Duration {
        let frames = self.required_consecutive_frames.saturating_add(1) as f32;
        Duration::try_from_secs_f32(frames / self.nominal_fps).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<(), DmsError> {
        if !self.ear_threshold.is_finite() || self.ear_threshold <= 0.0 {
            return Err(DmsError::Config(format!(
                "ear_threshold must be a positive number, got {}",
                self.ear_threshold
            )));
        }
        if !self.nominal_fps.is_finite() || self.nominal_fps <= 0.0 {
            return Err(DmsError::Config(format!(
                "nominal_fps must be a positive number, got {}",
                self.nominal_fps
            )));
        }
        Ok(())
    }
}
