//! Recorded landmark replay
//!
//! Plays back detector output captured as JSON lines, one line per frame:
//! a `FaceLandmarks` object, or `null` when no face was found. The "camera"
//! yields raw lines at a fixed rate and the "detector" parses them, so a
//! malformed line surfaces as a per-frame detector fault.

use crate::{
    DetectorError, FaceLandmarks, LandmarkDetector, ResourceFailure, ResourceProvider,
    SourceError, VideoSource,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Playback rate bounds (fps)
const MIN_FPS: f32 = 1.0;
const MAX_FPS: f32 = 240.0;

/// Replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// JSON lines file with recorded landmarks
    pub path: PathBuf,
    /// Playback rate
    pub fps: f32,
    /// Restart from the first frame at end of file
    pub looped: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("recordings/landmarks.jsonl"),
            fps: 30.0,
            looped: false,
        }
    }
}

impl ReplayConfig {
    /// Playback rate actually used, clamped to the supported range
    pub fn effective_fps(&self) -> f32 {
        if self.fps.is_finite() {
            self.fps.clamp(MIN_FPS, MAX_FPS)
        } else {
            MIN_FPS
        }
    }

    fn frame_period(&self) -> Duration {
        let fps = self.effective_fps();
        if fps != self.fps {
            warn!("Replay fps {} out of range, using {}", self.fps, fps);
        }
        Duration::from_secs_f32(1.0 / fps)
    }
}

/// One recorded frame
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub sequence: u64,
    line: String,
}

/// Recording played back as a video source
#[derive(Debug)]
pub struct ReplayVideo {
    lines: Vec<String>,
    cursor: usize,
    sequence: u64,
    looped: bool,
    interval: Interval,
}

impl ReplayVideo {
    fn new(lines: Vec<String>, period: Duration, looped: bool) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            lines,
            cursor: 0,
            sequence: 0,
            looped,
            interval,
        }
    }

    /// Frames in the recording
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl VideoSource for ReplayVideo {
    type Frame = ReplayFrame;

    async fn next_frame(&mut self) -> Result<ReplayFrame, SourceError> {
        // Only await point; state below changes after it resolves.
        self.interval.tick().await;

        if self.cursor >= self.lines.len() {
            if !self.looped || self.lines.is_empty() {
                return Err(SourceError::Ended);
            }
            debug!("Replay looping after {} frames", self.sequence);
            self.cursor = 0;
        }

        let frame = ReplayFrame {
            sequence: self.sequence,
            line: self.lines[self.cursor].clone(),
        };
        self.cursor += 1;
        self.sequence += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        debug!("Replay source released at frame {}", self.sequence);
    }
}

/// Parses recorded detector output
#[derive(Debug, Default)]
pub struct ReplayDetector {
    parsed: u64,
}

impl LandmarkDetector<ReplayFrame> for ReplayDetector {
    async fn detect(&mut self, frame: &ReplayFrame) -> Result<Option<FaceLandmarks>, DetectorError> {
        let face = serde_json::from_str::<Option<FaceLandmarks>>(&frame.line).map_err(|e| {
            DetectorError::Malformed(format!("frame {}: {}", frame.sequence, e))
        })?;
        self.parsed += 1;
        Ok(face)
    }

    fn release(&mut self) {
        debug!("Replay detector released after {} frames", self.parsed);
    }
}

/// Provider backed by a recording on disk
pub struct ReplayProvider {
    config: ReplayConfig,
}

impl ReplayProvider {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }
}

impl ResourceProvider for ReplayProvider {
    type Video = ReplayVideo;
    type Detector = ReplayDetector;

    async fn open_video(&mut self) -> Result<ReplayVideo, ResourceFailure> {
        let device = self.config.path.display().to_string();
        info!("Opening landmark recording {}", device);

        let contents = tokio::fs::read_to_string(&self.config.path)
            .await
            .map_err(|e| ResourceFailure::from_io(&device, &e))?;

        let lines: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();

        if lines.is_empty() {
            return Err(ResourceFailure::device_not_found(format!(
                "{}: recording has no frames",
                device
            )));
        }

        info!("Loaded {} recorded frames", lines.len());
        Ok(ReplayVideo::new(
            lines,
            self.config.frame_period(),
            self.config.looped,
        ))
    }

    async fn load_detector(&mut self) -> Result<ReplayDetector, ResourceFailure> {
        Ok(ReplayDetector::default())
    }
}
