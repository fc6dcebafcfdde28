// src/cooldown.rs
/// Last-fired timestamp for one event kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cooldown {
    last_fired: Option<f64>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strictly more than `period` seconds must have passed since the last fire.
    pub fn is_ready(&self, now: f64, period: f64) -> bool {
        match self.last_fired {
            Some(last) => now - last > period,
            None => true,
        }
    }

    pub fn mark(&mut self, now: f64) {
        self.last_fired = Some(now);
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_cooldown_is_ready() {
        assert!(Cooldown::new().is_ready(0.0, 10.0));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let mut cooldown = Cooldown::new();
        cooldown.mark(1.0);
        assert!(!cooldown.is_ready(2.0, 1.0));
        assert!(cooldown.is_ready(2.001, 1.0));
    }
}
