//! Monitor: session machine + resources + DMS pipeline

use alerting::{AlarmController, AlarmSink};
use chrono::Utc;
use dms::{DmsAnalysis, DmsConfig, DmsModule, SkipReason};
use landmark_source::{
    LandmarkDetector, Resource, ResourceFailure, ResourceProvider, SourceError, VideoSource,
};
use metrics::{counter, gauge};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::machine::{Effect, SessionMachine, SessionState};
use crate::snapshot::{MonitorSnapshot, SessionInfo, SessionStats};
use crate::SessionError;

/// Frame type produced by a provider's video source
pub type FrameOf<P> = <<P as ResourceProvider>::Video as VideoSource>::Frame;

/// Resources and pipeline of a running session
struct ActiveSession<P: ResourceProvider> {
    info: SessionInfo,
    video: P::Video,
    detector: P::Detector,
    dms: DmsModule,
}

/// Drowsiness monitor.
///
/// Processes at most one frame at a time: callers await `process_frame`
/// to completion before asking for the next frame.
pub struct Monitor<P: ResourceProvider> {
    provider: P,
    machine: SessionMachine,
    alarm: AlarmController,
    /// Validated pipeline template, cloned fresh for every session
    pipeline: DmsModule,
    staged_video: Option<P::Video>,
    staged_detector: Option<P::Detector>,
    active: Option<ActiveSession<P>>,
    stats: SessionStats,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
}

impl<P: ResourceProvider> Monitor<P> {
    /// Create a new monitor in the idle state
    pub fn new(
        config: DmsConfig,
        provider: P,
        alarm: impl AlarmSink + 'static,
    ) -> Result<Self, SessionError> {
        let pipeline = DmsModule::new(config)?;
        let (snapshot_tx, _) = watch::channel(MonitorSnapshot::default());

        info!(
            "Monitor created (threshold {}, onset after {} frames, ~{:?})",
            pipeline.config().ear_threshold,
            pipeline.config().required_consecutive_frames,
            pipeline.config().onset_latency()
        );

        Ok(Self {
            provider,
            machine: SessionMachine::new(),
            alarm: AlarmController::new(alarm),
            pipeline,
            staged_video: None,
            staged_detector: None,
            active: None,
            stats: SessionStats::default(),
            snapshot_tx,
        })
    }

    /// Start monitoring (Idle only)
    pub async fn start(&mut self) -> Result<(), SessionError> {
        let effects = self.machine.start()?;
        self.run_effects(effects).await
    }

    /// Re-attempt acquisition after a failure (Error only)
    pub async fn retry(&mut self) -> Result<(), SessionError> {
        let effects = self.machine.retry()?;
        self.run_effects(effects).await
    }

    /// Stop monitoring. Safe to call in any state.
    pub fn stop(&mut self) {
        let effects = self.machine.stop();
        self.apply(effects);
    }

    /// Set the mute flag; the verdict keeps updating while muted
    pub fn set_muted(&mut self, muted: bool) {
        let effects = self.machine.set_muted(muted);
        self.apply(effects);
    }

    /// Flip the mute flag, returning the new value
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.machine.muted();
        self.set_muted(muted);
        muted
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    /// Wait for the next frame of the active session.
    ///
    /// Cancel safe: dropping the future before it resolves loses no frame
    /// that was handed over. Returns `None` when no session is active.
    pub async fn next_frame(&mut self) -> Option<Result<FrameOf<P>, SourceError>> {
        let session = self.active.as_mut()?;
        Some(session.video.next_frame().await)
    }

    /// Run one frame through detector and pipeline, then update the session
    pub async fn process_frame(&mut self, frame: FrameOf<P>) -> Option<DmsAnalysis> {
        let session = self.active.as_mut()?;

        let analysis = match session.detector.detect(&frame).await {
            Ok(face) => session.dms.analyze(face.as_ref()),
            Err(e) => {
                warn!("Landmark detection failed, skipping frame: {}", e);
                session.dms.skip(SkipReason::DetectorFault)
            }
        };

        let was_drowsy = self.machine.verdict().is_drowsy();
        self.stats.record(&analysis, was_drowsy);

        let outcome = analysis.skipped.map_or("evaluated", |r| r.as_str());
        counter!("dms_frames_total", "outcome" => outcome).increment(1);

        if analysis.is_evaluated() {
            if analysis.is_drowsy() != was_drowsy {
                info!(
                    ear = analysis.ear.map(|r| r.average),
                    "Driver now {}", analysis.verdict
                );
            }
            match self.machine.record_verdict(analysis.verdict) {
                Ok(effects) => {
                    self.apply(effects);
                }
                Err(e) => warn!("Dropping verdict: {}", e),
            }
        } else {
            self.publish();
        }

        Some(analysis)
    }

    /// React to a video source error of the active session
    pub fn handle_source_error(&mut self, err: SourceError) {
        match err {
            SourceError::Ended => {
                info!("Video source ended");
                self.stop();
            }
            SourceError::Disconnected(detail) => {
                error!("Video source disconnected: {}", detail);
                match self.machine.interrupt(ResourceFailure::interrupted(detail)) {
                    Ok(effects) => {
                        self.apply(effects);
                    }
                    Err(e) => warn!("Ignoring disconnect: {}", e),
                }
            }
        }
    }

    /// Pull and process one frame. `None` when inactive or the source failed.
    pub async fn tick(&mut self) -> Option<DmsAnalysis> {
        match self.next_frame().await? {
            Ok(frame) => self.process_frame(frame).await,
            Err(e) => {
                self.handle_source_error(e);
                None
            }
        }
    }

    /// Current observable state
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.machine.state().clone();
        let error_message = match &state {
            SessionState::Error(failure) => Some(failure.cause.message()),
            _ => None,
        };
        MonitorSnapshot {
            state,
            error_message,
            muted: self.machine.muted(),
            verdict: self.machine.verdict(),
            alarm_armed: self.machine.alarm_armed(),
            session: self.active.as_ref().map(|s| s.info),
            stats: self.stats,
            alarm: self.alarm.stats(),
            updated_at: Utc::now(),
        }
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) -> Result<(), SessionError> {
        if self.apply(effects) {
            self.acquire().await
        } else {
            Ok(())
        }
    }

    /// Open the video source, then load the detector
    async fn acquire(&mut self) -> Result<(), SessionError> {
        match self.provider.open_video().await {
            Ok(video) => {
                debug!("Video source opened");
                self.staged_video = Some(video);
                let effects = self.machine.resource_ready(Resource::VideoSource)?;
                self.apply(effects);
            }
            Err(failure) => return Err(self.acquisition_failed(failure)),
        }

        match self.provider.load_detector().await {
            Ok(detector) => {
                debug!("Landmark detector loaded");
                self.staged_detector = Some(detector);
                let effects = self.machine.resource_ready(Resource::LandmarkDetector)?;
                self.apply(effects);
            }
            Err(failure) => return Err(self.acquisition_failed(failure)),
        }

        Ok(())
    }

    fn acquisition_failed(&mut self, failure: ResourceFailure) -> SessionError {
        error!("Resource acquisition failed: {}", failure);
        match self.machine.resource_failed(failure.clone()) {
            Ok(effects) => {
                self.apply(effects);
            }
            Err(e) => warn!("Ignoring acquisition failure: {}", e),
        }
        SessionError::Resource(failure)
    }

    /// Carry out effects; returns whether acquisition was requested
    fn apply(&mut self, effects: Vec<Effect>) -> bool {
        let mut acquire = false;
        for effect in effects {
            match effect {
                Effect::AcquireResources => acquire = true,
                Effect::ResetDebounce => self.activate(),
                Effect::ReleaseResources => self.release(),
                Effect::SetAlarm(armed) => {
                    if self.alarm.apply(armed) && armed {
                        counter!("dms_alarm_activations_total").increment(1);
                    }
                }
            }
        }
        self.publish();
        acquire
    }

    fn activate(&mut self) {
        let (Some(video), Some(detector)) = (self.staged_video.take(), self.staged_detector.take())
        else {
            error!("Session activated without staged resources");
            return;
        };

        let info = SessionInfo {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        };
        info!(session_id = %info.id, "Monitoring session started");

        self.stats = SessionStats::default();
        self.active = Some(ActiveSession {
            info,
            video,
            detector,
            dms: self.pipeline.fresh(),
        });
    }

    fn release(&mut self) {
        if let Some(mut video) = self.staged_video.take() {
            video.release();
        }
        if let Some(mut detector) = self.staged_detector.take() {
            detector.release();
        }
        if let Some(mut session) = self.active.take() {
            session.video.release();
            session.detector.release();
            info!(
                session_id = %session.info.id,
                frames = self.stats.frames_total,
                skipped = self.stats.frames_skipped(),
                episodes = self.stats.drowsy_episodes,
                "Monitoring session ended"
            );
        }
        // Debounce state goes with the session
        self.stats.consecutive_low_frames = 0;
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        gauge!("dms_drowsy").set(if snapshot.verdict.is_drowsy() { 1.0 } else { 0.0 });
        gauge!("dms_alarm_armed").set(if snapshot.alarm_armed { 1.0 } else { 0.0 });
        gauge!("dms_session_active").set(if snapshot.is_active() { 1.0 } else { 0.0 });
        self.snapshot_tx.send_replace(snapshot);
    }
}

impl<P: ResourceProvider> Drop for Monitor<P> {
    fn drop(&mut self) {
        self.release();
        self.alarm.disarm();
    }
}
