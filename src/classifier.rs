// src/classifier.rs - Gesture classifier boundary and a geometric fallback model
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GestureConfig;
use crate::landmarks::{HandJoint, PoseTensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    SnapReady,
    MiddleFinger,
    Incorrect,
}

impl GestureLabel {
    /// Maps a model output label. Anything unrecognized is `Incorrect`.
    pub fn from_model_label(label: &str) -> Self {
        match label {
            "snap_ready" => Self::SnapReady,
            "middle_finger" => Self::MiddleFinger,
            _ => Self::Incorrect,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SnapReady => "snap_ready",
            Self::MiddleFinger => "middle_finger",
            Self::Incorrect => "incorrect",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("gesture model is not loaded")]
    ModelUnavailable,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("malformed classifier output: {0}")]
    MalformedOutput(String),
}

/// What a model hands back before the pipeline interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassification {
    pub label: String,
    pub confidence: f64,
}

impl RawClassification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// One tick's decided classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureClassification {
    /// Label the pipeline acts on, after the confidence threshold.
    pub label: GestureLabel,
    /// Label the model reported.
    pub raw_label: GestureLabel,
    pub confidence: f64,
    pub timestamp: f64,
}

impl GestureClassification {
    /// Decides the label once at the classifier boundary. Failures close to
    /// `Incorrect` with zero confidence, and anything under `threshold` is
    /// forced to `Incorrect`.
    pub fn decide(
        result: Result<RawClassification, ClassifierError>,
        threshold: f64,
        timestamp: f64,
    ) -> Self {
        let (raw_label, confidence) = match result {
            Ok(raw) if (0.0..=1.0).contains(&raw.confidence) => {
                (GestureLabel::from_model_label(&raw.label), raw.confidence)
            }
            Ok(raw) => {
                warn!(
                    "{}",
                    ClassifierError::MalformedOutput(format!(
                        "confidence {} for '{}'",
                        raw.confidence, raw.label
                    ))
                );
                (GestureLabel::Incorrect, 0.0)
            }
            Err(e) => {
                warn!("Classifier failed: {}", e);
                (GestureLabel::Incorrect, 0.0)
            }
        };

        let label = if confidence < threshold {
            GestureLabel::Incorrect
        } else {
            raw_label
        };

        Self {
            label,
            raw_label,
            confidence,
            timestamp,
        }
    }
}

/// Black-box pose classifier over the 21-joint encoding.
pub trait GestureClassifier {
    fn classify(&mut self, pose: &PoseTensor) -> Result<RawClassification, ClassifierError>;
}

/// Rule-based stand-in for the trained model.
///
/// A pinch (thumb tip near the middle tip relative to palm length) reads as
/// `snap_ready`; a lone extended middle finger reads as `middle_finger`.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    /// Pinch distance as a fraction of palm length.
    pub pinch_ratio: f64,
    /// Tip-to-wrist over pip-to-wrist above this counts as extended.
    pub extended_ratio: f64,
    /// Tip-to-wrist over pip-to-wrist below this counts as curled.
    pub curled_ratio: f64,
    /// Joints at or below this are treated as missing, matching the snap
    /// tracker's gate.
    pub min_joint_confidence: f32,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self {
            pinch_ratio: 0.35,
            extended_ratio: 1.15,
            curled_ratio: 1.0,
            min_joint_confidence: GestureConfig::default().min_joint_confidence,
        }
    }
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self {
            min_joint_confidence: config.min_joint_confidence,
            ..Self::default()
        }
    }

    fn point(pose: &PoseTensor, joint: HandJoint) -> Vector2<f64> {
        let row = pose[joint.index()];
        Vector2::new(row[0] as f64, row[1] as f64)
    }

    /// How far the tip reaches past the pip, measured from the wrist.
    fn extension(pose: &PoseTensor, pip: HandJoint, tip: HandJoint) -> f64 {
        let wrist = Self::point(pose, HandJoint::Wrist);
        let pip_reach = (Self::point(pose, pip) - wrist).norm();
        let tip_reach = (Self::point(pose, tip) - wrist).norm();
        if pip_reach > 0.0 {
            tip_reach / pip_reach
        } else {
            0.0
        }
    }
}

impl GestureClassifier for HeuristicClassifier {
    fn classify(&mut self, pose: &PoseTensor) -> Result<RawClassification, ClassifierError> {
        let required = [
            HandJoint::Wrist,
            HandJoint::ThumbTip,
            HandJoint::MiddleMcp,
            HandJoint::MiddlePip,
            HandJoint::MiddleTip,
        ];
        if required
            .iter()
            .any(|joint| pose[joint.index()][2] <= self.min_joint_confidence)
        {
            return Ok(RawClassification::new(GestureLabel::Incorrect.as_str(), 0.0));
        }

        let palm = (Self::point(pose, HandJoint::MiddleMcp) - Self::point(pose, HandJoint::Wrist)).norm();
        if palm <= f64::EPSILON {
            return Err(ClassifierError::MalformedOutput("degenerate palm".to_string()));
        }

        let pinch = (Self::point(pose, HandJoint::ThumbTip) - Self::point(pose, HandJoint::MiddleTip)).norm() / palm;
        let middle = Self::extension(pose, HandJoint::MiddlePip, HandJoint::MiddleTip);
        let others = [
            Self::extension(pose, HandJoint::IndexPip, HandJoint::IndexTip),
            Self::extension(pose, HandJoint::RingPip, HandJoint::RingTip),
            Self::extension(pose, HandJoint::LittlePip, HandJoint::LittleTip),
        ];
        debug!("heuristic: pinch={:.3} middle={:.3} others={:?}", pinch, middle, others);

        if pinch < self.pinch_ratio {
            let confidence = 0.5 + 0.5 * (1.0 - pinch / self.pinch_ratio);
            return Ok(RawClassification::new(GestureLabel::SnapReady.as_str(), confidence));
        }

        if middle > self.extended_ratio && others.iter().all(|r| *r < self.curled_ratio) {
            let margin = ((middle - self.extended_ratio) / 0.5).min(1.0);
            let confidence = 0.7 + 0.3 * margin;
            return Ok(RawClassification::new(GestureLabel::MiddleFinger.as_str(), confidence));
        }

        Ok(RawClassification::new(GestureLabel::Incorrect.as_str(), 0.9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{HandShape, synthesize_hand};

    #[test]
    fn test_unknown_label_is_incorrect() {
        assert_eq!(GestureLabel::from_model_label("thumbs_up"), GestureLabel::Incorrect);
        assert_eq!(GestureLabel::from_model_label("snap_ready"), GestureLabel::SnapReady);
    }

    #[test]
    fn test_low_confidence_forces_incorrect() {
        let decided = GestureClassification::decide(
            Ok(RawClassification::new("middle_finger", 0.6)),
            0.7,
            1.0,
        );
        assert_eq!(decided.label, GestureLabel::Incorrect);
        assert_eq!(decided.raw_label, GestureLabel::MiddleFinger);
        assert_eq!(decided.confidence, 0.6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let decided = GestureClassification::decide(
            Ok(RawClassification::new("snap_ready", 0.7)),
            0.7,
            1.0,
        );
        assert_eq!(decided.label, GestureLabel::SnapReady);
    }

    #[test]
    fn test_failure_closes_to_incorrect() {
        let decided = GestureClassification::decide(Err(ClassifierError::ModelUnavailable), 0.0, 2.0);
        assert_eq!(decided.label, GestureLabel::Incorrect);
        assert_eq!(decided.confidence, 0.0);
        assert_eq!(decided.timestamp, 2.0);
    }

    #[test]
    fn test_out_of_range_confidence_is_malformed() {
        let decided = GestureClassification::decide(
            Ok(RawClassification::new("snap_ready", f64::NAN)),
            0.5,
            0.0,
        );
        assert_eq!(decided.label, GestureLabel::Incorrect);
        assert_eq!(decided.confidence, 0.0);
    }

    #[test]
    fn test_heuristic_reads_pinch() {
        let pose = synthesize_hand(HandShape::Pinch).encode();
        let result = HeuristicClassifier::new().classify(&pose).unwrap();
        assert_eq!(result.label, "snap_ready");
        assert!(result.confidence >= 0.7, "pinch confidence {}", result.confidence);
    }

    #[test]
    fn test_heuristic_reads_middle_finger() {
        let pose = synthesize_hand(HandShape::MiddleFinger).encode();
        let result = HeuristicClassifier::new().classify(&pose).unwrap();
        assert_eq!(result.label, "middle_finger");
        assert!(result.confidence >= 0.7);
    }

    #[test]
    fn test_heuristic_open_hand_is_incorrect() {
        let pose = synthesize_hand(HandShape::Open).encode();
        let result = HeuristicClassifier::new().classify(&pose).unwrap();
        assert_eq!(result.label, "incorrect");
    }

    #[test]
    fn test_heuristic_missing_joints_is_incorrect() {
        let result = HeuristicClassifier::new().classify(&[[0.0; 3]; 21]).unwrap();
        assert_eq!(result.label, "incorrect");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_heuristic_shares_joint_floor_with_config() {
        let config = GestureConfig::default();
        let mut pose = synthesize_hand(HandShape::Pinch).encode();
        pose[HandJoint::ThumbTip.index()][2] = 0.25;

        let result = HeuristicClassifier::from_config(&config).classify(&pose).unwrap();
        assert_eq!(result.label, "incorrect", "a joint the snap tracker rejects must not classify");

        let lenient = GestureConfig {
            min_joint_confidence: 0.2,
            ..config
        };
        let result = HeuristicClassifier::from_config(&lenient).classify(&pose).unwrap();
        assert_eq!(result.label, "snap_ready");
    }
}
