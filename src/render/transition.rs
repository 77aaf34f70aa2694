//! Eased value transitions for visual properties.
//!
//! Stroke and glow changes animate towards their new target instead of
//! snapping, the way CSS transitions would.

use crate::geometry::ease_out_cubic;

/// Retargets smaller than this are ignored.
const RETARGET_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Transition {
    /// A transition resting at `value`.
    pub fn new(value: f32, duration: f32) -> Self {
        Self {
            from: value,
            to: value,
            elapsed: duration,
            duration,
        }
    }

    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Start easing from the current value towards `target`.
    pub fn retarget(&mut self, target: f32) {
        if (target - self.to).abs() <= RETARGET_EPSILON {
            return;
        }
        self.from = self.value();
        self.to = target;
        self.elapsed = 0.0;
    }

    /// Advance by `dt` seconds and return the new value.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_transition_holds_value() {
        let mut t = Transition::new(0.4, 0.2);
        assert!(t.is_settled());
        assert_eq!(t.tick(1.0), 0.4);
    }

    #[test]
    fn eases_to_target_within_duration() {
        let mut t = Transition::new(0.0, 0.2);
        t.retarget(1.0);
        assert_eq!(t.value(), 0.0);

        let halfway = t.tick(0.1);
        // Ease-out covers most of the distance in the first half.
        assert!(halfway > 0.5 && halfway < 1.0);

        assert_eq!(t.tick(0.1), 1.0);
        assert!(t.is_settled());
    }

    #[test]
    fn retarget_mid_flight_starts_from_current_value() {
        let mut t = Transition::new(0.0, 0.2);
        t.retarget(1.0);
        let current = t.tick(0.05);
        t.retarget(0.0);
        assert!((t.value() - current).abs() < 1e-6);
        assert_eq!(t.target(), 0.0);
        t.tick(0.2);
        assert_eq!(t.value(), 0.0);
    }

    #[test]
    fn same_target_does_not_restart() {
        let mut t = Transition::new(0.0, 0.2);
        t.retarget(1.0);
        t.tick(0.15);
        let before = t;
        t.retarget(1.0);
        assert_eq!(t, before);
    }

    #[test]
    fn zero_duration_snaps() {
        let mut t = Transition::new(0.0, 0.0);
        t.retarget(3.0);
        assert_eq!(t.value(), 3.0);
    }
}
