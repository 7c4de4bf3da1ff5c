//! One-shot entrance animation
//!
//! An element starts hidden (shifted sideways and transparent). When its
//! scroll trigger first fires it waits out an optional delay, then eases to
//! its natural position and full opacity. Later triggers do nothing.

use super::timeline::{ElementRef, Easing, PropertyFrame, PropertyName};
use super::tween::Tween;

/// Where an entrance is in its one-shot run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntrancePhase {
    Hidden,
    /// Triggered; seconds left before motion starts
    Waiting(f64),
    Playing,
    Shown,
}

/// Slide-and-fade-in for one target
#[derive(Debug, Clone)]
pub struct EntranceReveal {
    target: ElementRef,
    phase: EntrancePhase,
    delay: f64,
    x: Tween,
    opacity: Tween,
}

impl EntranceReveal {
    /// Hidden at `offset` px along x; plays over `duration` seconds after `delay`
    pub fn new(target: ElementRef, offset: f64, duration: f64, delay: f64) -> Self {
        Self {
            target,
            phase: EntrancePhase::Hidden,
            delay: delay.max(0.0),
            x: Tween::settled(offset, duration, Easing::Power2Out),
            opacity: Tween::settled(0.0, duration, Easing::Power2Out),
        }
    }

    pub fn target(&self) -> &ElementRef {
        &self.target
    }

    pub fn phase(&self) -> EntrancePhase {
        self.phase
    }

    /// Needs frames to make progress
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, EntrancePhase::Waiting(_) | EntrancePhase::Playing)
    }

    /// Current (translate_x, opacity)
    pub fn state(&self) -> (f64, f64) {
        (self.x.value(), self.opacity.value())
    }

    /// Start the entrance; false if it already ran
    pub fn play(&mut self) -> bool {
        if self.phase != EntrancePhase::Hidden {
            return false;
        }
        self.phase = EntrancePhase::Waiting(self.delay);
        true
    }

    /// Advance by `dt` seconds; true if the written values changed
    pub fn advance(&mut self, dt: f64) -> bool {
        let mut dt = dt.max(0.0);
        if let EntrancePhase::Waiting(left) = self.phase {
            if dt < left {
                self.phase = EntrancePhase::Waiting(left - dt);
                return false;
            }
            dt -= left;
            self.x.retarget(0.0);
            self.opacity.retarget(1.0);
            self.phase = EntrancePhase::Playing;
        }
        if self.phase != EntrancePhase::Playing {
            return false;
        }

        self.x.advance(dt);
        self.opacity.advance(dt);
        if self.x.is_done() && self.opacity.is_done() {
            self.phase = EntrancePhase::Shown;
        }
        true
    }

    pub fn write_onto(&self, frame: &mut PropertyFrame) {
        let (x, opacity) = self.state();
        frame.set(&self.target, PropertyName::TranslateX, x);
        frame.set(&self.target, PropertyName::Opacity, opacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reveal(delay: f64) -> EntranceReveal {
        EntranceReveal::new(ElementRef::new(".code-card"), -50.0, 0.8, delay)
    }

    #[test]
    fn test_starts_hidden() {
        let r = reveal(0.0);
        assert_eq!(r.state(), (-50.0, 0.0));
        assert!(!r.is_animating());

        let mut frame = PropertyFrame::new();
        r.write_onto(&mut frame);
        assert_eq!(frame.get(r.target(), PropertyName::Opacity), Some(0.0));
        assert_eq!(frame.get(r.target(), PropertyName::TranslateX), Some(-50.0));
    }

    #[test]
    fn test_plays_once_to_rest() {
        let mut r = reveal(0.0);
        assert!(r.play());
        assert!(!r.play());

        assert!(r.advance(0.4));
        let (x, opacity) = r.state();
        assert!(x > -50.0 && x < 0.0);
        assert!(opacity > 0.0 && opacity < 1.0);

        r.advance(0.5);
        assert_eq!(r.state(), (0.0, 1.0));
        assert_eq!(r.phase(), EntrancePhase::Shown);
        assert!(!r.advance(0.1));
        assert!(!r.play());
    }

    #[test]
    fn test_delay_holds_then_carries_over() {
        let mut r = reveal(0.3);
        r.play();
        assert!(!r.advance(0.2));
        assert_eq!(r.state(), (-50.0, 0.0));
        assert_eq!(r.phase(), EntrancePhase::Waiting(0.3 - 0.2));

        // 0.1 s finishes the wait, the rest already moves
        assert!(r.advance(0.2));
        assert_eq!(r.phase(), EntrancePhase::Playing);
        assert!(r.state().1 > 0.0);
    }

    #[test]
    fn test_untriggered_never_moves() {
        let mut r = reveal(0.0);
        assert!(!r.advance(10.0));
        assert_eq!(r.phase(), EntrancePhase::Hidden);
    }
}
