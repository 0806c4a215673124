//! Observable monitor state

use alerting::AlarmStats;
use chrono::{DateTime, Utc};
use dms::{AlertVerdict, DmsAnalysis, SkipReason};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::machine::SessionState;

/// Identity of the running session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Per-session frame counters, reset whenever a session becomes active
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub frames_total: u64,
    pub frames_evaluated: u64,
    pub skipped_no_face: u64,
    pub skipped_degenerate: u64,
    pub skipped_corrupt: u64,
    pub skipped_detector_fault: u64,
    /// Alert -> Drowsy transitions
    pub drowsy_episodes: u64,
    pub consecutive_low_frames: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ear: Option<f32>,
}

impl SessionStats {
    pub(crate) fn record(&mut self, analysis: &DmsAnalysis, was_drowsy: bool) {
        self.frames_total += 1;
        self.consecutive_low_frames = analysis.consecutive_low_frames;

        match analysis.skipped {
            None => {
                self.frames_evaluated += 1;
                self.last_ear = analysis.ear.map(|r| r.average);
                if analysis.is_drowsy() && !was_drowsy {
                    self.drowsy_episodes += 1;
                }
            }
            Some(SkipReason::NoFace) => self.skipped_no_face += 1,
            Some(SkipReason::DegenerateGeometry) => self.skipped_degenerate += 1,
            Some(SkipReason::CorruptLandmarks) => self.skipped_corrupt += 1,
            Some(SkipReason::DetectorFault) => self.skipped_detector_fault += 1,
        }
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_total - self.frames_evaluated
    }
}

/// Read-only view of the monitor, published after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    #[serde(flatten)]
    pub state: SessionState,
    /// Human-readable error explanation in the error state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<&'static str>,
    pub muted: bool,
    pub verdict: AlertVerdict,
    pub alarm_armed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    pub stats: SessionStats,
    pub alarm: AlarmStats,
    pub updated_at: DateTime<Utc>,
}

impl Default for MonitorSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            error_message: None,
            muted: false,
            verdict: AlertVerdict::Alert,
            alarm_armed: false,
            session: None,
            stats: SessionStats::default(),
            alarm: AlarmStats::default(),
            updated_at: Utc::now(),
        }
    }
}

impl MonitorSnapshot {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::EarReading;
    use landmark_source::ResourceFailure;

    fn evaluated(average: f32, verdict: AlertVerdict) -> DmsAnalysis {
        DmsAnalysis {
            face_detected: true,
            ear: Some(EarReading {
                left: average,
                right: average,
                average,
            }),
            verdict,
            consecutive_low_frames: 0,
            skipped: None,
        }
    }

    #[test]
    fn test_stats_count_outcomes() {
        let mut stats = SessionStats::default();
        stats.record(&evaluated(0.3, AlertVerdict::Alert), false);
        stats.record(
            &DmsAnalysis {
                skipped: Some(SkipReason::NoFace),
                ..Default::default()
            },
            false,
        );
        stats.record(
            &DmsAnalysis {
                skipped: Some(SkipReason::DetectorFault),
                ..Default::default()
            },
            false,
        );

        assert_eq!(stats.frames_total, 3);
        assert_eq!(stats.frames_evaluated, 1);
        assert_eq!(stats.frames_skipped(), 2);
        assert_eq!(stats.skipped_no_face, 1);
        assert_eq!(stats.skipped_detector_fault, 1);
        assert_eq!(stats.last_ear, Some(0.3));
    }

    #[test]
    fn test_episodes_count_onsets_only() {
        let mut stats = SessionStats::default();
        stats.record(&evaluated(0.1, AlertVerdict::Drowsy), false);
        stats.record(&evaluated(0.1, AlertVerdict::Drowsy), true);
        stats.record(&evaluated(0.3, AlertVerdict::Alert), true);
        stats.record(&evaluated(0.1, AlertVerdict::Drowsy), false);
        assert_eq!(stats.drowsy_episodes, 2);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = MonitorSnapshot {
            state: SessionState::Error(ResourceFailure::permission_denied("blocked")),
            error_message: Some("Camera access was denied"),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["cause"], "permission_denied");
        assert_eq!(json["verdict"], "alert");
        assert_eq!(json["muted"], false);
        assert!(json.get("session").is_none());
    }
}
