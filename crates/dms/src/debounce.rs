//! Drowsiness debounce filter
//!
//! Onset is debounced: the average EAR has to stay below the threshold for
//! strictly more than `required_consecutive_frames` frames in a row. Release
//! is immediate: one frame at or above the threshold clears the verdict and
//! the run counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary alertness verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertVerdict {
    #[default]
    Alert,
    Drowsy,
}

impl AlertVerdict {
    pub fn is_drowsy(&self) -> bool {
        matches!(self, AlertVerdict::Drowsy)
    }
}

impl fmt::Display for AlertVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertVerdict::Alert => f.write_str("alert"),
            AlertVerdict::Drowsy => f.write_str("drowsy"),
        }
    }
}

/// Run-length state behind the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebounceState {
    /// Consecutive evaluated frames below the threshold
    pub consecutive_low_frames: u32,
    /// Current verdict
    pub verdict: AlertVerdict,
}

/// Debounce filter, one per monitoring session
#[derive(Debug, Clone, Default)]
pub struct DrowsinessFilter {
    state: DebounceState,
}

impl DrowsinessFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one evaluated frame. Skipped frames must not be fed.
    pub fn update(
        &mut self,
        ear_avg: f32,
        threshold: f32,
        required_consecutive_frames: u32,
    ) -> AlertVerdict {
        if ear_avg < threshold {
            self.state.consecutive_low_frames = self.state.consecutive_low_frames.saturating_add(1);
            if self.state.consecutive_low_frames > required_consecutive_frames {
                self.state.verdict = AlertVerdict::Drowsy;
            }
        } else {
            self.state = DebounceState::default();
        }
        self.state.verdict
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn verdict(&self) -> AlertVerdict {
        self.state.verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f32 = 0.22;
    const REQUIRED: u32 = 15;

    fn feed(filter: &mut DrowsinessFilter, ear: f32, frames: usize) -> Vec<AlertVerdict> {
        (0..frames)
            .map(|_| filter.update(ear, THRESHOLD, REQUIRED))
            .collect()
    }

    #[test]
    fn test_onset_after_more_than_required() {
        let mut filter = DrowsinessFilter::new();

        let verdicts = feed(&mut filter, 0.10, 15);
        assert!(verdicts.iter().all(|v| *v == AlertVerdict::Alert));
        assert_eq!(filter.state().consecutive_low_frames, 15);

        assert_eq!(filter.update(0.10, THRESHOLD, REQUIRED), AlertVerdict::Drowsy);
        assert_eq!(filter.state().consecutive_low_frames, 16);
    }

    #[test]
    fn test_drowsy_is_sticky_while_low() {
        let mut filter = DrowsinessFilter::new();
        feed(&mut filter, 0.10, 16);
        let verdicts = feed(&mut filter, 0.05, 100);
        assert!(verdicts.iter().all(|v| v.is_drowsy()));
    }

    #[test]
    fn test_instant_release() {
        let mut filter = DrowsinessFilter::new();
        feed(&mut filter, 0.10, 20);
        assert_eq!(filter.verdict(), AlertVerdict::Drowsy);

        assert_eq!(filter.update(0.30, THRESHOLD, REQUIRED), AlertVerdict::Alert);
        assert_eq!(filter.state(), DebounceState::default());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut filter = DrowsinessFilter::new();
        feed(&mut filter, 0.10, 10);
        filter.update(THRESHOLD, THRESHOLD, REQUIRED);
        assert_eq!(filter.state().consecutive_low_frames, 0);
    }

    #[test]
    fn test_blink_does_not_trigger() {
        let mut filter = DrowsinessFilter::new();
        for _ in 0..10 {
            feed(&mut filter, 0.30, 20);
            let blink = feed(&mut filter, 0.05, 6);
            assert!(blink.iter().all(|v| *v == AlertVerdict::Alert));
        }
    }

    #[test]
    fn test_zero_requirement_triggers_on_first_low_frame() {
        let mut filter = DrowsinessFilter::new();
        assert_eq!(filter.update(0.1, THRESHOLD, 0), AlertVerdict::Drowsy);
    }

    #[test]
    fn test_spec_scenario_sequence() {
        let mut filter = DrowsinessFilter::new();
        let mut verdicts = feed(&mut filter, 0.15, 20);
        verdicts.extend(feed(&mut filter, 0.25, 5));
        verdicts.extend(feed(&mut filter, 0.10, 20));

        let mut expected = vec![AlertVerdict::Alert; 15];
        expected.extend([AlertVerdict::Drowsy; 5]);
        expected.extend([AlertVerdict::Alert; 5]);
        expected.extend([AlertVerdict::Alert; 15]);
        expected.extend([AlertVerdict::Drowsy; 5]);
        assert_eq!(verdicts, expected);
    }
}
