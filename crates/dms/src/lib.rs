//! Driver Monitoring System (DMS)
//!
//! Real-time drowsiness detection from facial landmarks:
//! - Eye Aspect Ratio (EAR) per eye and averaged
//! - Debounced closed-eye detection (drowsiness onset)
//! - Skipping of frames without a reliable reading

pub mod analysis;
pub mod config;
pub mod debounce;
pub mod ear;
pub mod geometry;

pub use analysis::{DmsAnalysis, SkipReason};
pub use config::DmsConfig;
pub use debounce::{AlertVerdict, DebounceState, DrowsinessFilter};
pub use ear::{compute_average_ear, compute_ear, EarReading};

use landmark_source::{CorruptLandmarks, FaceLandmarks};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Degenerate eye geometry: eye corners coincide")]
    DegenerateGeometry,

    #[error("Corrupt landmark input: {0}")]
    CorruptLandmarks(#[from] CorruptLandmarks),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-session drowsiness pipeline: landmarks -> EAR -> debounce.
///
/// Created fresh whenever monitoring (re)starts so the debounce state never
/// leaks between sessions.
pub struct DmsModule {
    config: DmsConfig,
    filter: DrowsinessFilter,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            config,
            filter: DrowsinessFilter::new(),
        })
    }

    /// Same configuration, fresh debounce state
    pub fn fresh(&self) -> Self {
        Self {
            config: self.config.clone(),
            filter: DrowsinessFilter::new(),
        }
    }

    /// Analyze one frame's detector output (`None` = no face)
    pub fn analyze(&mut self, face: Option<&FaceLandmarks>) -> DmsAnalysis {
        let Some(face) = face else {
            trace!("No face this frame");
            return self.skip(SkipReason::NoFace);
        };

        match self.evaluate(face) {
            Ok(reading) => {
                let verdict = self.filter.update(
                    reading.average,
                    self.config.ear_threshold,
                    self.config.required_consecutive_frames,
                );
                DmsAnalysis {
                    face_detected: true,
                    ear: Some(reading),
                    verdict,
                    consecutive_low_frames: self.filter.state().consecutive_low_frames,
                    skipped: None,
                }
            }
            Err(DmsError::CorruptLandmarks(e)) => {
                warn!("Skipping frame with corrupt landmarks: {}", e);
                self.skipped_with_face(SkipReason::CorruptLandmarks)
            }
            Err(e) => {
                debug!("Skipping frame: {}", e);
                self.skipped_with_face(SkipReason::DegenerateGeometry)
            }
        }
    }

    fn evaluate(&self, face: &FaceLandmarks) -> Result<EarReading, DmsError> {
        let (left, right) = face.eyes()?;
        EarReading::from_eyes(&left, &right)
    }

    /// Record a frame that produced no usable reading
    pub fn skip(&self, reason: SkipReason) -> DmsAnalysis {
        let state = self.filter.state();
        DmsAnalysis {
            face_detected: false,
            ear: None,
            verdict: state.verdict,
            consecutive_low_frames: state.consecutive_low_frames,
            skipped: Some(reason),
        }
    }

    fn skipped_with_face(&self, reason: SkipReason) -> DmsAnalysis {
        DmsAnalysis {
            face_detected: true,
            ..self.skip(reason)
        }
    }

    /// Current debounce state
    pub fn state(&self) -> DebounceState {
        self.filter.state()
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmark_source::scripted::{synthetic_eye, synthetic_face};
    use landmark_source::Point2D;

    fn module() -> DmsModule {
        DmsModule::new(DmsConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DmsConfig {
            ear_threshold: -1.0,
            ..Default::default()
        };
        assert!(DmsModule::new(config).is_err());
    }

    #[test]
    fn test_evaluated_frame() {
        let mut dms = module();
        let analysis = dms.analyze(Some(&synthetic_face(0.3)));
        assert!(analysis.is_evaluated());
        assert!(analysis.face_detected);
        assert!((analysis.ear.unwrap().average - 0.3).abs() < 1e-6);
        assert_eq!(analysis.verdict, AlertVerdict::Alert);
    }

    #[test]
    fn test_no_face_leaves_state_unchanged() {
        let mut dms = module();
        for _ in 0..10 {
            dms.analyze(Some(&synthetic_face(0.1)));
        }
        let before = dms.state();

        let analysis = dms.analyze(None);
        assert_eq!(analysis.skipped, Some(SkipReason::NoFace));
        assert!(!analysis.face_detected);
        assert_eq!(dms.state(), before);
        assert_eq!(analysis.consecutive_low_frames, 10);
    }

    #[test]
    fn test_degenerate_frame_skipped() {
        let mut dms = module();
        for _ in 0..16 {
            dms.analyze(Some(&synthetic_face(0.1)));
        }
        let before = dms.state();
        assert_eq!(before.verdict, AlertVerdict::Drowsy);

        let collapsed = FaceLandmarks::new(vec![Point2D::new(0.5, 0.5); 6], synthetic_eye(0.3));
        let analysis = dms.analyze(Some(&collapsed));
        assert_eq!(analysis.skipped, Some(SkipReason::DegenerateGeometry));
        assert_eq!(analysis.verdict, AlertVerdict::Drowsy);
        assert_eq!(dms.state(), before);
    }

    #[test]
    fn test_corrupt_frame_skipped() {
        let mut dms = module();
        dms.analyze(Some(&synthetic_face(0.1)));
        let before = dms.state();

        let short = FaceLandmarks::new(synthetic_eye(0.1)[..4].to_vec(), synthetic_eye(0.1));
        let analysis = dms.analyze(Some(&short));
        assert_eq!(analysis.skipped, Some(SkipReason::CorruptLandmarks));

        let mut nan = synthetic_face(0.1);
        nan.right[1].y = f32::NAN;
        assert_eq!(
            dms.analyze(Some(&nan)).skipped,
            Some(SkipReason::CorruptLandmarks)
        );
        assert_eq!(dms.state(), before);
    }

    #[test]
    fn test_skips_do_not_break_run() {
        let mut dms = module();
        for i in 0..16 {
            dms.analyze(Some(&synthetic_face(0.1)));
            // Interleaved skips must neither count nor reset the run
            dms.analyze(None);
            if i < 15 {
                assert_eq!(dms.state().verdict, AlertVerdict::Alert);
            }
        }
        assert_eq!(dms.state().verdict, AlertVerdict::Drowsy);
    }

    #[test]
    fn test_end_to_end_verdicts() {
        let mut dms = module();
        let ears = std::iter::repeat(0.15)
            .take(20)
            .chain(std::iter::repeat(0.25).take(5))
            .chain(std::iter::repeat(0.10).take(20));

        let drowsy: Vec<bool> = ears
            .map(|ear| dms.analyze(Some(&synthetic_face(ear))).is_drowsy())
            .collect();

        let expected: Vec<bool> = [(false, 15), (true, 5), (false, 5), (false, 15), (true, 5)]
            .iter()
            .flat_map(|&(d, n)| std::iter::repeat(d).take(n))
            .collect();
        assert_eq!(drowsy, expected);
    }

    #[test]
    fn test_analysis_serialization_omits_empty() {
        let dms = module();
        let json = serde_json::to_string(&dms.skip(SkipReason::NoFace)).unwrap();
        assert!(json.contains("\"skipped\":\"no_face\""));
        assert!(!json.contains("\"ear\""));
    }
}
