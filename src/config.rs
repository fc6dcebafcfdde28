// src/config.rs - Gesture thresholds read by the pipeline on every tick
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_PROCESSING_FPS: f64 = 1.0;
pub const MAX_PROCESSING_FPS: f64 = 60.0;

/// Thresholds consumed by the signal tracker, hold confirmer and pipeline.
///
/// The pipeline never mutates or persists this; callers hand it the current
/// snapshot each tick, so edits take effect on the next processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Number of normalized distance samples in the snap window.
    pub history_size: usize,
    /// Minimum window-average slope for a snap.
    pub velocity_threshold: f64,
    /// Newest distance must exceed oldest by this factor.
    pub distance_change_threshold: f64,
    /// Latest velocity must exceed the previous one by this factor.
    pub velocity_acceleration_threshold: f64,
    /// Absolute floor on the newest normalized distance.
    pub min_normalized_distance: f64,
    pub snap_cooldown_period: f64,
    pub middle_finger_hold_duration: f64,
    pub middle_finger_cooldown_period: f64,
    pub min_joint_confidence: f32,
    /// Classifier results below this are treated as `Incorrect`.
    pub confidence_threshold: f64,
    pub processing_fps: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            history_size: 8,
            velocity_threshold: 0.02,
            distance_change_threshold: 1.25,
            velocity_acceleration_threshold: 1.1,
            min_normalized_distance: 0.15,
            snap_cooldown_period: 1.0,
            middle_finger_hold_duration: 1.0,
            middle_finger_cooldown_period: 2.0,
            min_joint_confidence: 0.3,
            confidence_threshold: 0.7,
            processing_fps: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl GestureConfig {
    /// Minimum spacing between processed frames, in seconds.
    pub fn frame_process_interval(&self) -> f64 {
        if self.processing_fps > 0.0 {
            1.0 / self.processing_fps
        } else {
            0.0
        }
    }

    /// Advisory checks for the settings boundary. Nothing here is enforced
    /// at tick time.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |field: &'static str, message: String| {
            warnings.push(ConfigWarning { field, message });
        };

        if !(MIN_PROCESSING_FPS..=MAX_PROCESSING_FPS).contains(&self.processing_fps) {
            warn(
                "processing_fps",
                format!(
                    "{} is outside {}..={} fps",
                    self.processing_fps, MIN_PROCESSING_FPS, MAX_PROCESSING_FPS
                ),
            );
        }
        if self.history_size < 2 {
            warn(
                "history_size",
                format!("{} samples cannot produce a velocity", self.history_size),
            );
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            warn(
                "confidence_threshold",
                format!("{} is outside [0, 1]", self.confidence_threshold),
            );
        }
        if !(0.0..=1.0).contains(&self.min_joint_confidence) {
            warn(
                "min_joint_confidence",
                format!("{} is outside [0, 1]", self.min_joint_confidence),
            );
        }
        if self.distance_change_threshold < 1.0 {
            warn(
                "distance_change_threshold",
                format!("{} accepts shrinking distances", self.distance_change_threshold),
            );
        }
        for (field, value) in [
            ("snap_cooldown_period", self.snap_cooldown_period),
            ("middle_finger_hold_duration", self.middle_finger_hold_duration),
            ("middle_finger_cooldown_period", self.middle_finger_cooldown_period),
        ] {
            if value <= 0.0 {
                warn(field, format!("{} s is not a positive duration", value));
            }
        }

        warnings
    }
}
