//! Monitoring Session
//!
//! Owns the lifecycle of a drowsiness monitoring session:
//! - Session state machine (idle, loading, active, error) with mute gating
//! - Frame processing loop feeding the DMS pipeline one frame at a time
//! - Driver task serializing control commands and frame ticks
//! - Read-only snapshot published to observers

pub mod driver;
pub mod machine;
pub mod monitor;
pub mod snapshot;

pub use driver::{spawn, Command, MonitorHandle};
pub use machine::{Effect, SessionMachine, SessionState};
pub use monitor::Monitor;
pub use snapshot::{MonitorSnapshot, SessionInfo, SessionStats};

use dms::DmsError;
use landmark_source::ResourceFailure;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Cannot {event} while session is {state}")]
    InvalidTransition {
        event: &'static str,
        state: &'static str,
    },

    #[error("Resource acquisition failed: {0}")]
    Resource(#[from] ResourceFailure),

    #[error("Invalid configuration: {0}")]
    Config(#[from] DmsError),

    #[error("Monitor task is not running")]
    MonitorClosed,
}
