//! Alarm Controller Implementation

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Audio playback collaborator.
///
/// Only receives changes; starting, stopping and looping the sound is up
/// to the implementation.
pub trait AlarmSink: Send {
    fn set_armed(&mut self, armed: bool);
}

impl<S: AlarmSink + ?Sized> AlarmSink for Box<S> {
    fn set_armed(&mut self, armed: bool) {
        (**self).set_armed(armed)
    }
}

/// Sink that only logs, for headless deployments
#[derive(Debug, Default)]
pub struct LogAlarm;

impl AlarmSink for LogAlarm {
    fn set_armed(&mut self, armed: bool) {
        if armed {
            warn!("DROWSINESS ALARM ON");
        } else {
            info!("Drowsiness alarm off");
        }
    }
}

/// Sink recording every change it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingAlarm {
    events: Arc<Mutex<Vec<bool>>>,
}

impl RecordingAlarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes received so far
    pub fn events(&self) -> Vec<bool> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AlarmSink for RecordingAlarm {
    fn set_armed(&mut self, armed: bool) {
        if let Ok(mut events) = self.events.lock() {
            events.push(armed);
        }
    }
}

/// Alarm activation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmStats {
    /// Times the alarm went from disarmed to armed
    pub activations: u64,
    /// Total time spent armed, excluding the current activation
    pub armed_ms: u64,
}

/// Alarm controller deduplicating arm/disarm requests
pub struct AlarmController {
    /// Audio collaborator
    sink: Box<dyn AlarmSink>,
    /// Whether the alarm is currently armed
    armed: bool,
    /// When the current activation started
    armed_since: Option<Instant>,
    /// Statistics
    stats: AlarmStats,
}

impl AlarmController {
    /// Create a new alarm controller
    pub fn new(sink: impl AlarmSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            armed: false,
            armed_since: None,
            stats: AlarmStats::default(),
        }
    }

    /// Request an armed state. Returns true when the sink was notified.
    pub fn apply(&mut self, armed: bool) -> bool {
        if armed == self.armed {
            debug!("Alarm already {}", if armed { "armed" } else { "disarmed" });
            return false;
        }

        self.armed = armed;
        if armed {
            self.stats.activations += 1;
            self.armed_since = Some(Instant::now());
            info!("Alarm armed (activation {})", self.stats.activations);
        } else if let Some(since) = self.armed_since.take() {
            let elapsed = since.elapsed();
            self.stats.armed_ms += elapsed.as_millis() as u64;
            info!("Alarm disarmed after {:?}", elapsed);
        }

        self.sink.set_armed(armed);
        true
    }

    /// Disarm if armed
    pub fn disarm(&mut self) -> bool {
        self.apply(false)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn stats(&self) -> AlarmStats {
        self.stats
    }
}

impl Default for AlarmController {
    fn default() -> Self {
        Self::new(LogAlarm)
    }
}
