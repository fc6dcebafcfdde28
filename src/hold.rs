// src/hold.rs - Duration-gated confirmation for a held pose
use tracing::{debug, info};

use crate::config::GestureConfig;
use crate::cooldown::Cooldown;

/// Fires once a pose has been held continuously for the configured duration.
///
/// Any tick without the pose clears the timer, so a later reappearance has to
/// wait the full duration again. When the duration is met but the cooldown is
/// still running, the timer is kept and the check repeats on the next tick.
#[derive(Debug, Clone, Default)]
pub struct HoldConfirmer {
    start_time: Option<f64>,
    cooldown: Cooldown,
}

impl HoldConfirmer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, is_held: bool, now: f64, config: &GestureConfig) -> bool {
        if !is_held {
            self.clear();
            return false;
        }

        let Some(start) = self.start_time else {
            debug!("hold timer started at {:.3}s", now);
            self.start_time = Some(now);
            return false;
        };

        let held_for = now - start;
        if held_for >= config.middle_finger_hold_duration
            && self
                .cooldown
                .is_ready(now, config.middle_finger_cooldown_period)
        {
            self.cooldown.mark(now);
            self.start_time = None;
            info!("Hold confirmed after {:.3}s", held_for);
            return true;
        }

        false
    }

    /// Drops any partial hold.
    pub fn clear(&mut self) {
        self.start_time = None;
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn held_for(&self, now: f64) -> Option<f64> {
        self.start_time.map(|start| now - start)
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.cooldown.last_fired()
    }
}
