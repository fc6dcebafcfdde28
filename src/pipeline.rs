// src/pipeline.rs - Per-tick orchestration of classification, hold and snap tracking
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{GestureClassification, GestureClassifier, GestureLabel};
use crate::config::GestureConfig;
use crate::hold::HoldConfirmer;
use crate::landmarks::{HandLandmarks, LandmarkProvider};
use crate::signal::SignalTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Initializing,
    LookingForGesture,
    SnapReady,
    MiddleFingerDetected,
    Error,
}

impl DisplayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::LookingForGesture => "looking_for_gesture",
            Self::SnapReady => "snap_ready",
            Self::MiddleFingerDetected => "middle_finger_detected",
            Self::Error => "error",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "initializing" => Self::Initializing,
            "looking_for_gesture" => Self::LookingForGesture,
            "snap_ready" => Self::SnapReady,
            "middle_finger_detected" => Self::MiddleFingerDetected,
            _ => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmedEvent {
    Snap,
    MiddleFingerHeld,
}

impl ConfirmedEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snap => "snap",
            Self::MiddleFingerHeld => "middle_finger_held",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "snap" => Some(Self::Snap),
            "middle_finger_held" => Some(Self::MiddleFingerHeld),
            _ => None,
        }
    }
}

/// Read-only view for a preview overlay, refreshed once per processed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot {
    pub state: DisplayState,
    pub distance: Option<f64>,
    pub confidence: f64,
    pub thumb_tip: Option<Vector2<f64>>,
    pub middle_tip: Option<Vector2<f64>>,
    pub processed_ticks: u64,
    pub snaps: u64,
    pub middle_finger_holds: u64,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            state: DisplayState::Initializing,
            distance: None,
            confidence: 0.0,
            thumb_tip: None,
            middle_tip: None,
            processed_ticks: 0,
            snaps: 0,
            middle_finger_holds: 0,
        }
    }
}

/// Everything one processed tick saw and decided.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub timestamp: f64,
    pub state: DisplayState,
    pub classification: Option<GestureClassification>,
    pub landmarks: Option<HandLandmarks>,
    pub distance: Option<f64>,
    pub events: Vec<ConfirmedEvent>,
}

/// Owns all tracker state for one camera session. Only the frame-processing
/// task may call into it.
pub struct GesturePipeline<P, C> {
    provider: P,
    classifier: C,
    signal: SignalTracker,
    hold: HoldConfirmer,
    snapshot: PipelineSnapshot,
    last_processed: Option<f64>,
    enabled: bool,
}

impl<P, C> GesturePipeline<P, C>
where
    P: LandmarkProvider,
    C: GestureClassifier,
{
    pub fn new(provider: P, classifier: C) -> Self {
        Self {
            provider,
            classifier,
            signal: SignalTracker::new(),
            hold: HoldConfirmer::new(),
            snapshot: PipelineSnapshot::default(),
            last_processed: None,
            enabled: true,
        }
    }

    /// Pausing keeps every history intact so resuming picks up smoothly.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!("Gesture pipeline {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn snapshot(&self) -> &PipelineSnapshot {
        &self.snapshot
    }

    pub fn signal(&self) -> &SignalTracker {
        &self.signal
    }

    pub fn hold(&self) -> &HoldConfirmer {
        &self.hold
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    /// Processes one frame and returns the events it confirmed.
    pub fn tick(&mut self, frame: &P::Frame, now: f64, config: &GestureConfig) -> Vec<ConfirmedEvent> {
        self.process(frame, now, config)
            .map(|record| record.events)
            .unwrap_or_default()
    }

    /// Like `tick`, but reports the full decision. `None` means the frame was
    /// skipped (pipeline disabled or inside the rate gate) and nothing changed.
    pub fn process(&mut self, frame: &P::Frame, now: f64, config: &GestureConfig) -> Option<TickRecord> {
        if !self.enabled {
            return None;
        }
        if let Some(last) = self.last_processed {
            if now - last < config.frame_process_interval() {
                return None;
            }
        }
        self.last_processed = Some(now);
        self.snapshot.processed_ticks += 1;

        let hands = self.provider.detect(frame);
        let Some(pose) = hands.into_iter().next() else {
            self.enter(DisplayState::Error);
            // No pose means no held pose either.
            self.hold.clear();
            self.snapshot.distance = None;
            self.snapshot.confidence = 0.0;
            self.snapshot.thumb_tip = None;
            self.snapshot.middle_tip = None;
            return Some(TickRecord {
                timestamp: now,
                state: DisplayState::Error,
                classification: None,
                landmarks: None,
                distance: None,
                events: Vec::new(),
            });
        };

        let result = self.classifier.classify(&pose.encode());
        let classification = GestureClassification::decide(result, config.confidence_threshold, now);
        self.snapshot.confidence = classification.confidence;

        let mut events = Vec::new();
        match classification.label {
            GestureLabel::SnapReady => {
                self.enter(DisplayState::SnapReady);
                self.hold.clear();
            }
            GestureLabel::MiddleFinger => {
                self.enter(DisplayState::MiddleFingerDetected);
                if self.hold.observe(true, now, config) {
                    events.push(ConfirmedEvent::MiddleFingerHeld);
                }
            }
            GestureLabel::Incorrect => {
                self.enter(DisplayState::LookingForGesture);
                self.hold.clear();
                self.snapshot.distance = None;
            }
        }

        // Snap tracking runs whatever the label said.
        let landmarks = pose.tracked_landmarks();
        if let Some(hand) = &landmarks {
            self.snapshot.thumb_tip = Some(hand.thumb_tip.position);
            self.snapshot.middle_tip = Some(hand.middle_tip.position);
            if self.signal.observe(hand, now, config) {
                events.push(ConfirmedEvent::Snap);
            }
            if classification.label != GestureLabel::Incorrect
                && hand.all_confident(config.min_joint_confidence)
            {
                self.snapshot.distance = self.signal.latest_distance();
            }
        } else {
            self.snapshot.thumb_tip = None;
            self.snapshot.middle_tip = None;
        }

        for event in &events {
            match event {
                ConfirmedEvent::Snap => self.snapshot.snaps += 1,
                ConfirmedEvent::MiddleFingerHeld => self.snapshot.middle_finger_holds += 1,
            }
            info!("Confirmed {} at {:.3}s", event.as_str(), now);
        }

        Some(TickRecord {
            timestamp: now,
            state: self.snapshot.state,
            classification: Some(classification),
            landmarks,
            distance: self.snapshot.distance,
            events,
        })
    }

    fn enter(&mut self, state: DisplayState) {
        if self.snapshot.state != state {
            debug!("display state {} -> {}", self.snapshot.state.as_str(), state.as_str());
            self.snapshot.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, RawClassification};
    use crate::landmarks::{HandJoint, HandPose, JointPoint, PoseTensor};

    /// Frame carrying the pose the provider should report, if any.
    struct Frame(Option<HandPose>);

    struct PassThrough;

    impl LandmarkProvider for PassThrough {
        type Frame = Frame;

        fn detect(&mut self, frame: &Frame) -> Vec<HandPose> {
            frame.0.clone().into_iter().collect()
        }
    }

    /// Returns whatever label was queued last.
    struct Fixed(Result<(&'static str, f64), ()>);

    impl GestureClassifier for Fixed {
        fn classify(&mut self, _pose: &PoseTensor) -> Result<RawClassification, ClassifierError> {
            match self.0 {
                Ok((label, confidence)) => Ok(RawClassification::new(label, confidence)),
                Err(()) => Err(ClassifierError::Inference("boom".to_string())),
            }
        }
    }

    fn frame(distance: f64) -> Frame {
        Frame(Some(
            HandPose::new()
                .with_joint(HandJoint::ThumbTip, JointPoint::new(0.5 - distance, 0.0, 0.9))
                .with_joint(HandJoint::MiddleTip, JointPoint::new(0.5, 0.0, 0.9))
                .with_joint(HandJoint::Wrist, JointPoint::new(0.5, 1.0, 0.9)),
        ))
    }

    fn pipeline(label: &'static str) -> GesturePipeline<PassThrough, Fixed> {
        GesturePipeline::new(PassThrough, Fixed(Ok((label, 0.95))))
    }

    #[test]
    fn test_starts_initializing() {
        let p = pipeline("incorrect");
        assert_eq!(p.snapshot().state, DisplayState::Initializing);
    }

    #[test]
    fn test_label_drives_display_state() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        p.tick(&frame(0.1), 0.0, &config);
        assert_eq!(p.snapshot().state, DisplayState::SnapReady);

        *p.classifier_mut() = Fixed(Ok(("middle_finger", 0.95)));
        p.tick(&frame(0.1), 1.0, &config);
        assert_eq!(p.snapshot().state, DisplayState::MiddleFingerDetected);

        *p.classifier_mut() = Fixed(Ok(("incorrect", 0.95)));
        p.tick(&frame(0.1), 2.0, &config);
        assert_eq!(p.snapshot().state, DisplayState::LookingForGesture);
        assert!(p.snapshot().distance.is_none());
    }

    #[test]
    fn test_no_hand_enters_error_and_recovers() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        let record = p.process(&Frame(None), 0.0, &config).unwrap();
        assert_eq!(record.state, DisplayState::Error);
        assert!(record.events.is_empty());

        p.tick(&frame(0.1), 1.0, &config);
        assert_eq!(p.snapshot().state, DisplayState::SnapReady);
    }

    #[test]
    fn test_low_confidence_forces_looking() {
        let config = GestureConfig::default();
        let mut p = GesturePipeline::new(PassThrough, Fixed(Ok(("middle_finger", 0.5))));
        p.tick(&frame(0.1), 0.0, &config);
        assert_eq!(p.snapshot().state, DisplayState::LookingForGesture);
        assert!(p.hold().start_time().is_none());
    }

    #[test]
    fn test_classifier_failure_degrades_to_looking() {
        let config = GestureConfig::default();
        let mut p = GesturePipeline::new(PassThrough, Fixed(Err(())));
        let record = p.process(&frame(0.1), 0.0, &config).unwrap();
        assert_eq!(record.state, DisplayState::LookingForGesture);
        assert_eq!(record.classification.unwrap().confidence, 0.0);
        // Distance tracking still ran
        assert_eq!(p.signal().distance_history().len(), 1);
    }

    #[test]
    fn test_rate_gate_skips_without_side_effects() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        assert!(p.process(&frame(0.1), 0.0, &config).is_some());

        *p.classifier_mut() = Fixed(Ok(("incorrect", 0.95)));
        let before = p.snapshot().clone();
        assert!(p.process(&frame(0.4), 0.03, &config).is_none());
        assert_eq!(p.snapshot(), &before);
        assert_eq!(p.signal().distance_history().len(), 1);

        assert!(p.process(&frame(0.4), 0.07, &config).is_some());
    }

    #[test]
    fn test_disabled_pipeline_keeps_history() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        for i in 0..5 {
            p.tick(&frame(0.1), i as f64 * 0.1, &config);
        }
        p.set_enabled(false);
        assert!(!p.is_enabled());
        assert!(p.process(&frame(0.1), 1.0, &config).is_none());
        assert_eq!(p.signal().distance_history().len(), 5);

        p.set_enabled(true);
        p.tick(&frame(0.1), 1.1, &config);
        assert_eq!(p.signal().distance_history().len(), 6);
    }

    #[test]
    fn test_snap_tracked_while_showing_other_labels() {
        let config = GestureConfig::default();
        let mut p = pipeline("incorrect");
        let mut fired = Vec::new();
        for i in 0..10 {
            fired.extend(p.tick(&frame(0.1), i as f64 * 0.1, &config));
        }
        fired.extend(p.tick(&frame(0.5), 1.0, &config));
        assert_eq!(fired, vec![ConfirmedEvent::Snap]);
        assert_eq!(p.snapshot().snaps, 1);
    }

    #[test]
    fn test_middle_finger_hold_emits_event() {
        let config = GestureConfig::default();
        let mut p = pipeline("middle_finger");
        let mut fired = Vec::new();
        for i in 0..=5 {
            fired.extend(p.tick(&frame(0.1), i as f64 * 0.25, &config));
        }
        assert_eq!(fired, vec![ConfirmedEvent::MiddleFingerHeld]);
        assert_eq!(p.snapshot().middle_finger_holds, 1);
    }

    #[test]
    fn test_no_hand_tick_resets_hold() {
        let config = GestureConfig::default();
        let mut p = pipeline("middle_finger");
        p.tick(&frame(0.1), 0.0, &config);
        p.tick(&frame(0.1), 0.5, &config);
        p.tick(&Frame(None), 0.75, &config);
        assert!(p.hold().start_time().is_none());
        let fired: Vec<_> = [1.0, 1.5, 1.75]
            .iter()
            .flat_map(|t| p.tick(&frame(0.1), *t, &config))
            .collect();
        assert!(fired.is_empty(), "{:?}", fired);
    }

    #[test]
    fn test_snapshot_reflects_confident_tick() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        p.tick(&frame(0.1), 0.0, &config);

        let snapshot = p.snapshot();
        assert_eq!(snapshot.state, DisplayState::SnapReady);
        assert_eq!(snapshot.confidence, 0.95);
        let distance = snapshot.distance.expect("confident tick shows a distance");
        assert!((distance - 0.1).abs() < 1e-9, "distance {}", distance);
        assert_eq!(snapshot.thumb_tip, Some(Vector2::new(0.4, 0.0)));
        assert_eq!(snapshot.middle_tip, Some(Vector2::new(0.5, 0.0)));
        assert_eq!(snapshot.processed_ticks, 1);
    }

    #[test]
    fn test_no_hand_clears_snapshot_readings() {
        let config = GestureConfig::default();
        let mut p = pipeline("snap_ready");
        p.tick(&frame(0.1), 0.0, &config);
        assert!(p.snapshot().distance.is_some());

        p.tick(&Frame(None), 0.25, &config);
        let snapshot = p.snapshot();
        assert_eq!(snapshot.state, DisplayState::Error);
        assert!(snapshot.distance.is_none(), "stale distance left on screen");
        assert_eq!(snapshot.confidence, 0.0);
        assert!(snapshot.thumb_tip.is_none());
        assert!(snapshot.middle_tip.is_none());
        assert_eq!(snapshot.processed_ticks, 2);
    }
}
