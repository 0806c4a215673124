//! Session state machine
//!
//! Pure transition logic, no I/O. Every transition returns the side effects
//! the caller has to carry out, in order.
//!
//! ```text
//! Idle --start--> Loading --both resources ready--> Active --stop--> Idle
//!                    |                                 |
//!                    +--failure--> Error <--interrupt--+
//!                                    |
//!                                    +--retry--> Loading
//! ```

use dms::AlertVerdict;
use landmark_source::{Resource, ResourceFailure};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::SessionError;

/// Lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Active,
    Error(ResourceFailure),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Active => "active",
            SessionState::Error(_) => "error",
        }
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Open the camera and load the detector
    AcquireResources,
    /// Start a fresh debounce state
    ResetDebounce,
    /// Release camera and detector, discard the debounce state
    ReleaseResources,
    /// Alarm armed state changed
    SetAlarm(bool),
}

/// Session state machine
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
    video_ready: bool,
    detector_ready: bool,
    muted: bool,
    verdict: AlertVerdict,
    alarm_armed: bool,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Loading
    pub fn start(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.state {
            SessionState::Idle => Ok(self.enter_loading()),
            _ => Err(self.invalid("start")),
        }
    }

    /// Error -> Loading
    pub fn retry(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.state {
            SessionState::Error(_) => Ok(self.enter_loading()),
            _ => Err(self.invalid("retry")),
        }
    }

    /// A resource reported ready; Active once both are
    pub fn resource_ready(&mut self, resource: Resource) -> Result<Vec<Effect>, SessionError> {
        if self.state != SessionState::Loading {
            return Err(self.invalid("mark a resource ready"));
        }

        match resource {
            Resource::VideoSource => self.video_ready = true,
            Resource::LandmarkDetector => self.detector_ready = true,
        }
        debug!("Resource ready: {:?}", resource);

        if self.video_ready && self.detector_ready {
            info!("Session active");
            self.state = SessionState::Active;
            self.verdict = AlertVerdict::Alert;
            self.alarm_armed = false;
            Ok(vec![Effect::ResetDebounce])
        } else {
            Ok(Vec::new())
        }
    }

    /// Loading -> Error
    pub fn resource_failed(&mut self, failure: ResourceFailure) -> Result<Vec<Effect>, SessionError> {
        if self.state != SessionState::Loading {
            return Err(self.invalid("fail acquisition"));
        }
        info!("Session failed: {}", failure);
        self.state = SessionState::Error(failure);
        Ok(vec![Effect::ReleaseResources])
    }

    /// Active -> Error, when the stream breaks mid-session
    pub fn interrupt(&mut self, failure: ResourceFailure) -> Result<Vec<Effect>, SessionError> {
        if self.state != SessionState::Active {
            return Err(self.invalid("interrupt"));
        }
        info!("Session interrupted: {}", failure);
        let mut effects = self.leave_active();
        self.state = SessionState::Error(failure);
        effects.push(Effect::ReleaseResources);
        Ok(effects)
    }

    /// Active/Loading -> Idle. A no-op in Idle and Error.
    pub fn stop(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Active => {
                info!("Session stopped");
                let mut effects = self.leave_active();
                self.state = SessionState::Idle;
                effects.push(Effect::ReleaseResources);
                effects
            }
            SessionState::Loading => {
                info!("Session start cancelled");
                self.state = SessionState::Idle;
                vec![Effect::ReleaseResources]
            }
            SessionState::Idle | SessionState::Error(_) => Vec::new(),
        }
    }

    /// Record the verdict of an evaluated frame
    pub fn record_verdict(&mut self, verdict: AlertVerdict) -> Result<Vec<Effect>, SessionError> {
        if self.state != SessionState::Active {
            return Err(self.invalid("record a verdict"));
        }
        self.verdict = verdict;
        Ok(self.sync_alarm())
    }

    /// Set the mute flag; allowed in every state
    pub fn set_muted(&mut self, muted: bool) -> Vec<Effect> {
        if self.muted != muted {
            info!("Alarm {}", if muted { "muted" } else { "unmuted" });
        }
        self.muted = muted;
        if self.state == SessionState::Active {
            self.sync_alarm()
        } else {
            Vec::new()
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn verdict(&self) -> AlertVerdict {
        self.verdict
    }

    pub fn alarm_armed(&self) -> bool {
        self.alarm_armed
    }

    fn enter_loading(&mut self) -> Vec<Effect> {
        info!("Session loading");
        self.state = SessionState::Loading;
        self.video_ready = false;
        self.detector_ready = false;
        vec![Effect::AcquireResources]
    }

    fn leave_active(&mut self) -> Vec<Effect> {
        self.verdict = AlertVerdict::Alert;
        self.sync_alarm()
    }

    fn sync_alarm(&mut self) -> Vec<Effect> {
        let armed = self.verdict.is_drowsy() && !self.muted;
        if armed == self.alarm_armed {
            return Vec::new();
        }
        self.alarm_armed = armed;
        vec![Effect::SetAlarm(armed)]
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            event,
            state: self.state.name(),
        }
    }
}
