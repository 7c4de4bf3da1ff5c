//! Obelisk FX - pointer- and scroll-reactive page effects
//!
//! Core modules:
//! - `fx`: Pure effect simulation (particles, force grid, scroll timeline, typewriter)
//! - `renderer`: Raster surface and DOM projection layer
//! - `platform`: Frame/timer/event/pin collaborators (manual + browser)
//! - `lifecycle`: Activation and teardown of all running effects
//! - `page`: The page script (sections, timelines, terminal lines)
//! - `settings`: Data-driven effect tuning

pub mod fx;
pub mod lifecycle;
pub mod page;
pub mod platform;
pub mod renderer;
pub mod settings;

pub use lifecycle::{Collaborators, EffectsRuntime, FrameToken, RuntimePhase};
pub use settings::{EffectsConfig, QualityPreset};

use glam::DVec2;

/// Effect tuning constants
pub mod consts {
    /// Particles per pool at the default quality
    pub const PARTICLE_POOL_SIZE: usize = 1500;
    /// Maximum particle depth (respawn depth)
    pub const PARTICLE_Z_MAX: f64 = 2000.0;
    /// Depth units travelled per frame
    pub const PARTICLE_VELOCITY: f64 = 4.0;
    /// Pinhole camera focal length
    pub const PARTICLE_FOCAL_LENGTH: f64 = 300.0;
    /// Added to depth before the perspective divide
    pub const PARTICLE_DEPTH_EPSILON: f64 = 0.1;
    /// Depth span over which particles fade in
    pub const PARTICLE_FADE_RANGE: f64 = 1000.0;

    /// Force grid lattice spacing (px)
    pub const GRID_CELL_SIZE: f64 = 30.0;
    /// Smallest spacing accepted from config; finer lattices flood the DOM
    pub const MIN_GRID_CELL_SIZE: f64 = 4.0;
    /// Grid extends past the viewport to cover scroll overshoot
    pub const GRID_HEIGHT_FACTOR: f64 = 1.5;
    /// Pointer repulsion radius (px)
    pub const GRID_RADIUS: f64 = 350.0;
    /// Displacement at the pointer itself (px)
    pub const GRID_MAX_DISPLACEMENT: f64 = 50.0;

    /// Typewriter per-character delay bounds (ms)
    pub const TYPE_MIN_DELAY_MS: f64 = 10.0;
    pub const TYPE_MAX_DELAY_MS: f64 = 40.0;
    /// Pause between terminal lines (ms)
    pub const TYPE_LINE_PAUSE_MS: f64 = 200.0;

    /// Monolith pointer tilt
    pub const PARALLAX_MAX_ROTATE_Y: f64 = 15.0;
    pub const PARALLAX_BASE_ROTATE_X: f64 = 10.0;
    pub const PARALLAX_ROTATE_X_RANGE: f64 = -10.0;
    /// Seconds the tilt takes to settle on a new pointer target
    pub const PARALLAX_DURATION: f64 = 1.0;

    /// Frame delta clamp (seconds), keeps tweens sane after a hidden tab
    pub const MAX_FRAME_DT: f64 = 0.1;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position of `value` within `[start, end]`, clamped to [0, 1]
///
/// A degenerate range acts as a step at `end`.
#[inline]
pub fn normalize_progress(value: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span <= f64::EPSILON {
        return if value >= end { 1.0 } else { 0.0 };
    }
    ((value - start) / span).clamp(0.0, 1.0)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: DVec2) -> (f64, f64) {
    (pos.length(), pos.y.atan2(pos.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_progress_clamps() {
        assert_eq!(normalize_progress(-0.5, 0.2, 0.6), 0.0);
        assert_eq!(normalize_progress(0.9, 0.2, 0.6), 1.0);
        assert!((normalize_progress(0.4, 0.2, 0.6) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_progress_degenerate_range() {
        assert_eq!(normalize_progress(0.29, 0.3, 0.3), 0.0);
        assert_eq!(normalize_progress(0.3, 0.3, 0.3), 1.0);
    }

    #[test]
    fn test_polar_roundtrip() {
        let p = polar_to_cartesian(5.0, 0.75);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 5.0).abs() < 1e-9);
        assert!((theta - 0.75).abs() < 1e-9);
    }
}
