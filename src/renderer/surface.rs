//! 2D raster surface the particle field paints into

use std::cell::RefCell;
use std::rc::Rc;

use crate::fx::Viewport;

/// Straight-alpha color, 8-bit channels plus float alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS color string for canvas `fillStyle`
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

/// A paint target sized in viewport pixels
pub trait RasterSurface {
    /// Match the backing store to the viewport
    fn resize(&mut self, viewport: Viewport);
    /// Fill the whole surface with `color`
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba);
}

/// A single recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    Rect { x: f64, y: f64, w: f64, h: f64, color: Rgba },
}

/// Surface that records draw calls instead of painting (tests, native runs)
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub viewport: Viewport,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands since the most recent clear (one frame's worth)
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear(_)))
            .unwrap_or(0);
        &self.commands[start..]
    }

    pub fn rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
    }
}

impl RasterSurface for RecordingSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.commands.push(DrawCommand::Rect { x, y, w, h, color });
    }
}

impl<S: RasterSurface> RasterSurface for Rc<RefCell<S>> {
    fn resize(&mut self, viewport: Viewport) {
        self.borrow_mut().resize(viewport);
    }

    fn clear(&mut self, color: Rgba) {
        self.borrow_mut().clear(color);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.borrow_mut().fill_rect(x, y, w, h, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_colors() {
        assert_eq!(Rgba::rgb(3, 3, 3).to_css(), "#030303");
        assert_eq!(
            Rgba::rgb(255, 0, 60).with_alpha(0.5).to_css(),
            "rgba(255, 0, 60, 0.5)"
        );
    }

    #[test]
    fn test_last_frame_starts_at_clear() {
        let mut s = RecordingSurface::new();
        s.clear(Rgba::rgb(0, 0, 0));
        s.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::rgb(1, 1, 1));
        s.clear(Rgba::rgb(0, 0, 0));
        s.fill_rect(2.0, 2.0, 1.0, 1.0, Rgba::rgb(1, 1, 1));
        assert_eq!(s.last_frame().len(), 2);
        assert_eq!(s.rects().count(), 2);
    }
}
