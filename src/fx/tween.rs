//! Time-based easing of a single value

use super::timeline::Easing;
use crate::lerp;

/// A single eased value moving from `from` to `to` over `duration` seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    elapsed: f64,
    duration: f64,
    easing: Easing,
}

impl Tween {
    /// A tween already resting at `value`
    pub fn settled(value: f64, duration: f64, easing: Easing) -> Self {
        Self {
            from: value,
            to: value,
            elapsed: duration,
            duration,
            easing,
        }
    }

    pub fn value(&self) -> f64 {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        lerp(self.from, self.to, self.easing.apply(t))
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Start easing from the current value toward `to`
    pub fn retarget(&mut self, to: f64) {
        self.from = self.value();
        self.to = to;
        self.elapsed = 0.0;
    }

    pub fn advance(&mut self, dt: f64) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration.max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_holds_value() {
        let t = Tween::settled(3.0, 1.0, Easing::Power2Out);
        assert_eq!(t.value(), 3.0);
        assert!(t.is_done());
    }

    #[test]
    fn test_runs_to_target_and_stops() {
        let mut t = Tween::settled(0.0, 1.0, Easing::None);
        t.retarget(10.0);
        t.advance(0.25);
        assert!((t.value() - 2.5).abs() < 1e-12);
        t.advance(5.0);
        assert_eq!(t.value(), 10.0);
        assert!(t.is_done());
    }

    #[test]
    fn test_retarget_mid_flight_is_continuous() {
        let mut t = Tween::settled(0.0, 1.0, Easing::Power3Out);
        t.retarget(1.0);
        t.advance(0.1);
        let shown = t.value();
        t.retarget(-1.0);
        assert_eq!(t.value(), shown);
        assert!(!t.is_done());
    }

    #[test]
    fn test_zero_duration_jumps() {
        let mut t = Tween::settled(0.0, 0.0, Easing::Power1Out);
        t.retarget(4.0);
        assert_eq!(t.value(), 4.0);
        assert!(t.is_done());
    }
}
