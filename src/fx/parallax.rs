//! Pointer tilt for the hero monolith
//!
//! The pointer's position within the viewport picks a target rotation; the
//! element eases toward it over a fixed duration. Each pointer event restarts
//! the ease from wherever the element currently is. The result is layered on
//! top of the scroll timeline's rotation for the same element, but only once
//! the pointer has moved; until then the element keeps its authored pose.

use glam::DVec2;

use super::timeline::{ElementRef, Easing, PropertyFrame, PropertyName};
use super::tween::Tween;
use super::viewport::Viewport;
use crate::settings::ParallaxConfig;

/// Tilt state for one element
#[derive(Debug, Clone)]
pub struct PointerParallax {
    target: ElementRef,
    config: ParallaxConfig,
    rotate_x: Tween,
    rotate_y: Tween,
    /// Set by the first pointer event
    engaged: bool,
}

impl PointerParallax {
    pub fn new(target: &str, config: ParallaxConfig) -> Self {
        Self {
            target: ElementRef::new(target),
            config,
            rotate_x: Tween::settled(0.0, config.duration, Easing::Power2Out),
            rotate_y: Tween::settled(0.0, config.duration, Easing::Power2Out),
            engaged: false,
        }
    }

    pub fn target(&self) -> &ElementRef {
        &self.target
    }

    /// Current (rotate_x, rotate_y) in degrees
    pub fn rotation(&self) -> (f64, f64) {
        (self.rotate_x.value(), self.rotate_y.value())
    }

    /// Rotation the element is heading for
    pub fn target_rotation(&self) -> (f64, f64) {
        (self.rotate_x.target(), self.rotate_y.target())
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn is_settled(&self) -> bool {
        self.rotate_x.is_done() && self.rotate_y.is_done()
    }

    /// Aim at a new pointer position (viewport px)
    pub fn on_pointer_move(&mut self, pointer: DVec2, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        let nx = pointer.x / viewport.width - 0.5;
        let ny = pointer.y / viewport.height - 0.5;

        self.rotate_y.retarget(nx * self.config.max_rotate_y);
        self.rotate_x
            .retarget(self.config.base_rotate_x + ny * self.config.rotate_x_range);
        self.engaged = true;
    }

    /// Advance the ease by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        self.rotate_x.advance(dt);
        self.rotate_y.advance(dt);
    }

    /// Add the tilt onto a timeline frame; no-op before the first pointer move
    pub fn layer_onto(&self, frame: &mut PropertyFrame) {
        if !self.engaged {
            return;
        }
        let (rx, ry) = self.rotation();
        frame.add(&self.target, PropertyName::RotateX, rx);
        frame.add(&self.target, PropertyName::RotateY, ry);
    }
}
