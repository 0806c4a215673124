//! Scripted in-memory sources for tests and demos

use crate::{
    DetectorError, FaceLandmarks, LandmarkDetector, Point2D, ResourceFailure, ResourceProvider,
    SourceError, VideoSource,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Build a six-point eye whose EAR is exactly `ear`.
///
/// Corners sit one unit apart on the x axis; lids are placed `ear / 2`
/// above and below it.
pub fn synthetic_eye(ear: f32) -> Vec<Point2D> {
    let h = ear / 2.0;
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(1.0 / 3.0, h),
        Point2D::new(2.0 / 3.0, h),
        Point2D::new(1.0, 0.0),
        Point2D::new(2.0 / 3.0, -h),
        Point2D::new(1.0 / 3.0, -h),
    ]
}

/// Face with both eyes at the given EAR
pub fn synthetic_face(ear: f32) -> FaceLandmarks {
    FaceLandmarks::new(synthetic_eye(ear), synthetic_eye(ear))
}

/// One scripted tick
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Detector reports these landmarks
    Face(FaceLandmarks),
    /// Detector reports no face
    NoFace,
    /// Detector call fails
    DetectorFault,
    /// Video source drops out
    Disconnect,
}

impl ScriptStep {
    /// Face with both eyes at `ear`
    pub fn ear(ear: f32) -> Self {
        Self::Face(synthetic_face(ear))
    }

    /// `count` consecutive faces at `ear`
    pub fn ears(ear: f32, count: usize) -> impl Iterator<Item = ScriptStep> {
        std::iter::repeat_with(move || Self::ear(ear)).take(count)
    }
}

/// Counters shared between a provider and the test observing it
#[derive(Debug, Clone, Default)]
pub struct ScriptCounters {
    inner: Arc<CounterCells>,
}

#[derive(Debug, Default)]
struct CounterCells {
    videos_opened: AtomicUsize,
    videos_released: AtomicUsize,
    detectors_loaded: AtomicUsize,
    detectors_released: AtomicUsize,
    detect_calls: AtomicUsize,
}

impl ScriptCounters {
    pub fn videos_opened(&self) -> usize {
        self.inner.videos_opened.load(Ordering::SeqCst)
    }

    pub fn videos_released(&self) -> usize {
        self.inner.videos_released.load(Ordering::SeqCst)
    }

    pub fn detectors_loaded(&self) -> usize {
        self.inner.detectors_loaded.load(Ordering::SeqCst)
    }

    pub fn detectors_released(&self) -> usize {
        self.inner.detectors_released.load(Ordering::SeqCst)
    }

    pub fn detect_calls(&self) -> usize {
        self.inner.detect_calls.load(Ordering::SeqCst)
    }
}

/// Scripted frame handed from video to detector
#[derive(Debug, Clone)]
pub struct ScriptedFrame(ScriptStep);

/// Video source playing a script
pub struct ScriptedVideo {
    steps: VecDeque<ScriptStep>,
    hold_open: bool,
    counters: ScriptCounters,
}

impl VideoSource for ScriptedVideo {
    type Frame = ScriptedFrame;

    async fn next_frame(&mut self) -> Result<ScriptedFrame, SourceError> {
        match self.steps.pop_front() {
            Some(ScriptStep::Disconnect) => {
                Err(SourceError::Disconnected("scripted disconnect".into()))
            }
            Some(step) => Ok(ScriptedFrame(step)),
            None if self.hold_open => std::future::pending().await,
            None => Err(SourceError::Ended),
        }
    }

    fn release(&mut self) {
        self.counters
            .inner
            .videos_released
            .fetch_add(1, Ordering::SeqCst);
    }
}

/// Detector echoing the scripted step
pub struct ScriptedDetector {
    counters: ScriptCounters,
}

impl LandmarkDetector<ScriptedFrame> for ScriptedDetector {
    async fn detect(&mut self, frame: &ScriptedFrame) -> Result<Option<FaceLandmarks>, DetectorError> {
        self.counters.inner.detect_calls.fetch_add(1, Ordering::SeqCst);
        match &frame.0 {
            ScriptStep::Face(face) => Ok(Some(face.clone())),
            ScriptStep::NoFace => Ok(None),
            ScriptStep::DetectorFault | ScriptStep::Disconnect => {
                Err(DetectorError::Inference("scripted fault".into()))
            }
        }
    }

    fn release(&mut self) {
        self.counters
            .inner
            .detectors_released
            .fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider replaying the same script on every session.
///
/// Injected failures are consumed one acquisition attempt at a time, so a
/// retry after a failure succeeds unless another failure is queued.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Vec<ScriptStep>,
    hold_open: bool,
    video_failures: VecDeque<ResourceFailure>,
    detector_failures: VecDeque<ResourceFailure>,
    counters: ScriptCounters,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Keep the stream open (pending) once the script is exhausted
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Fail the next video open
    pub fn fail_video(mut self, failure: ResourceFailure) -> Self {
        self.video_failures.push_back(failure);
        self
    }

    /// Fail the next detector load
    pub fn fail_detector(mut self, failure: ResourceFailure) -> Self {
        self.detector_failures.push_back(failure);
        self
    }

    pub fn counters(&self) -> ScriptCounters {
        self.counters.clone()
    }
}

impl ResourceProvider for ScriptedProvider {
    type Video = ScriptedVideo;
    type Detector = ScriptedDetector;

    async fn open_video(&mut self) -> Result<ScriptedVideo, ResourceFailure> {
        if let Some(failure) = self.video_failures.pop_front() {
            return Err(failure);
        }
        self.counters.inner.videos_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Scripted video opened with {} steps", self.script.len());
        Ok(ScriptedVideo {
            steps: self.script.iter().cloned().collect(),
            hold_open: self.hold_open,
            counters: self.counters.clone(),
        })
    }

    async fn load_detector(&mut self) -> Result<ScriptedDetector, ResourceFailure> {
        if let Some(failure) = self.detector_failures.pop_front() {
            return Err(failure);
        }
        self.counters
            .inner
            .detectors_loaded
            .fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedDetector {
            counters: self.counters.clone(),
        })
    }
}
