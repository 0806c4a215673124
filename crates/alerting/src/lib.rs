//! Alarm Control
//!
//! Outbound side of the drowsiness monitor: forwards "alarm armed" changes
//! to the audio collaborator exactly once per change and keeps activation
//! statistics.

mod manager;

pub use manager::{AlarmController, AlarmSink, AlarmStats, LogAlarm, RecordingAlarm};
