// src/signal.rs - Velocity-based snap detection over normalized finger distance
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::config::GestureConfig;
use crate::cooldown::Cooldown;
use crate::landmarks::HandLandmarks;

pub const VELOCITY_HISTORY_SIZE: usize = 4;
const MIN_VELOCITY_SAMPLES: usize = 3;

/// Turns a stream of thumb-to-middle distances into one-shot snap decisions.
///
/// A snap shows up as a sharp, brief rise in the normalized distance. The
/// tracker requires a full window, a rising slope, an accelerating slope and
/// an absolute floor before it fires, then holds off for the cooldown.
#[derive(Debug, Clone, Default)]
pub struct SignalTracker {
    distance_history: VecDeque<f64>,
    velocity_history: VecDeque<f64>,
    cooldown: Cooldown,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one tick of landmarks. Returns true exactly when a snap fires.
    ///
    /// Low-confidence joints make this a no-op: neither history is touched.
    pub fn observe(&mut self, hand: &HandLandmarks, now: f64, config: &GestureConfig) -> bool {
        if !hand.all_confident(config.min_joint_confidence) {
            return false;
        }

        let window = config.history_size.max(1);
        self.distance_history.push_back(hand.normalized_distance());
        while self.distance_history.len() > window {
            self.distance_history.pop_front();
        }

        if self.distance_history.len() < window {
            return false;
        }

        let (Some(&oldest), Some(&newest)) =
            (self.distance_history.front(), self.distance_history.back())
        else {
            return false;
        };

        // Average slope over the whole window, not a pointwise derivative.
        let velocity = (newest - oldest) / window as f64;
        self.velocity_history.push_back(velocity);
        while self.velocity_history.len() > VELOCITY_HISTORY_SIZE {
            self.velocity_history.pop_front();
        }

        if self.velocity_history.len() < MIN_VELOCITY_SAMPLES {
            return false;
        }

        let rapid_increase = velocity > config.velocity_threshold
            && newest > oldest * config.distance_change_threshold;
        let accelerating = self.is_accelerating(config.velocity_acceleration_threshold);
        let above_floor = newest > config.min_normalized_distance;

        debug!(
            "snap gates: velocity={:.4} newest={:.3} oldest={:.3} rapid={} accel={} floor={}",
            velocity, newest, oldest, rapid_increase, accelerating, above_floor
        );

        if rapid_increase && accelerating && above_floor {
            if self.cooldown.is_ready(now, config.snap_cooldown_period) {
                self.cooldown.mark(now);
                info!("Snap detected at {:.3}s (velocity {:.4})", now, velocity);
                return true;
            }
            debug!("snap suppressed by cooldown");
        }

        false
    }

    fn is_accelerating(&self, factor: f64) -> bool {
        let len = self.velocity_history.len();
        if len < 2 {
            return false;
        }
        self.velocity_history[len - 1] > self.velocity_history[len - 2] * factor
    }

    pub fn distance_history(&self) -> &VecDeque<f64> {
        &self.distance_history
    }

    pub fn velocity_history(&self) -> &VecDeque<f64> {
        &self.velocity_history
    }

    pub fn latest_distance(&self) -> Option<f64> {
        self.distance_history.back().copied()
    }

    pub fn last_snap(&self) -> Option<f64> {
        self.cooldown.last_fired()
    }
}
