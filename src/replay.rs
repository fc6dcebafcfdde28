// src/replay.rs - Re-run a recorded session under a different configuration
use tracing::debug;

use crate::classifier::{ClassifierError, GestureClassifier, RawClassification};
use crate::config::GestureConfig;
use crate::data::TickRow;
use crate::landmarks::{HandJoint, HandPose, JointPoint, LandmarkProvider, PoseTensor};
use crate::pipeline::{ConfirmedEvent, DisplayState, GesturePipeline};

/// Rebuilds the tracked joints from a recorded row.
#[derive(Debug, Default)]
pub struct RecordedHandProvider;

impl LandmarkProvider for RecordedHandProvider {
    type Frame = TickRow;

    fn detect(&mut self, row: &TickRow) -> Vec<HandPose> {
        // Unrecognized states read as Error, i.e. no hand
        if DisplayState::from_str_lossy(&row.state) == DisplayState::Error {
            return Vec::new();
        }

        let mut pose = HandPose::new();
        let joints = [
            (HandJoint::ThumbTip, row.thumb_x, row.thumb_y, row.thumb_confidence),
            (HandJoint::MiddleTip, row.middle_x, row.middle_y, row.middle_confidence),
            (HandJoint::Wrist, row.wrist_x, row.wrist_y, row.wrist_confidence),
        ];
        for (joint, x, y, confidence) in joints {
            if let (Some(x), Some(y), Some(confidence)) = (x, y, confidence) {
                pose.insert(joint, JointPoint::new(x, y, confidence));
            }
        }
        vec![pose]
    }
}

/// Answers with the recorded model output for the row being replayed.
#[derive(Debug, Default)]
pub struct RecordedClassifier {
    next: Option<RawClassification>,
}

impl RecordedClassifier {
    pub fn load(&mut self, row: &TickRow) {
        self.next = match (&row.raw_label, row.confidence) {
            (Some(label), Some(confidence)) => Some(RawClassification::new(label.clone(), confidence)),
            _ => None,
        };
    }
}

impl GestureClassifier for RecordedClassifier {
    fn classify(&mut self, _pose: &PoseTensor) -> Result<RawClassification, ClassifierError> {
        self.next.take().ok_or(ClassifierError::ModelUnavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayedEvent {
    pub timestamp: f64,
    pub event: ConfirmedEvent,
}

/// Feeds recorded rows through a fresh pipeline and collects what it fires.
pub fn replay_session(rows: &[TickRow], config: &GestureConfig) -> Vec<ReplayedEvent> {
    let mut pipeline = GesturePipeline::new(RecordedHandProvider, RecordedClassifier::default());
    let mut fired = Vec::new();

    for row in rows {
        pipeline.classifier_mut().load(row);
        for event in pipeline.tick(row, row.timestamp, config) {
            fired.push(ReplayedEvent {
                timestamp: row.timestamp,
                event,
            });
        }
    }

    debug!("replayed {} rows, {} events", rows.len(), fired.len());
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SessionRecorder;
    use crate::simulation::SimulatedHandProvider;
    use crate::classifier::HeuristicClassifier;
    use crate::video::CapturedFrame;

    fn record_simulation(config: &GestureConfig, seconds: f64) -> Vec<TickRow> {
        let mut pipeline = GesturePipeline::new(SimulatedHandProvider::new(), HeuristicClassifier::new());
        let mut recorder = SessionRecorder::new(std::env::temp_dir(), Some("replay".to_string()));
        let frames = (seconds * 30.0) as usize;
        for i in 0..frames {
            let t = i as f64 / 30.0;
            if let Some(record) = pipeline.process(&CapturedFrame::synthetic(t), t, config) {
                recorder.add_tick(&record);
            }
        }
        recorder.rows().to_vec()
    }

    #[test]
    fn test_replay_reproduces_live_events() {
        let config = GestureConfig::default();
        let rows = record_simulation(&config, 16.0);
        let live: Vec<_> = rows
            .iter()
            .flat_map(|row| row.events().into_iter().map(move |e| (row.timestamp, e)))
            .collect();
        assert!(!live.is_empty(), "simulation should confirm gestures");

        let replayed: Vec<_> = replay_session(&rows, &config)
            .into_iter()
            .map(|r| (r.timestamp, r.event))
            .collect();
        assert_eq!(replayed, live);
    }

    #[test]
    fn test_stricter_threshold_suppresses_holds() {
        let config = GestureConfig::default();
        let rows = record_simulation(&config, 16.0);
        let strict = GestureConfig {
            confidence_threshold: 0.99,
            ..config
        };
        let replayed = replay_session(&rows, &strict);
        assert!(replayed
            .iter()
            .all(|r| r.event != ConfirmedEvent::MiddleFingerHeld));
    }

    #[test]
    fn test_error_rows_replay_as_missing_hand() {
        let row = TickRow {
            timestamp: 0.0,
            state: "error".to_string(),
            label: None,
            raw_label: None,
            confidence: None,
            distance: None,
            thumb_x: None,
            thumb_y: None,
            thumb_confidence: None,
            middle_x: None,
            middle_y: None,
            middle_confidence: None,
            wrist_x: None,
            wrist_y: None,
            wrist_confidence: None,
            events: String::new(),
        };
        assert!(RecordedHandProvider.detect(&row).is_empty());

        let garbled = TickRow {
            state: "sideways".to_string(),
            ..row.clone()
        };
        assert!(RecordedHandProvider.detect(&garbled).is_empty());

        let ready = TickRow {
            state: "snap_ready".to_string(),
            thumb_x: Some(0.4),
            thumb_y: Some(0.0),
            thumb_confidence: Some(0.9),
            ..row
        };
        let hands = RecordedHandProvider.detect(&ready);
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].len(), 1);
    }
}
