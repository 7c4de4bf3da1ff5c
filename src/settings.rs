//! Effect configuration
//!
//! Read once at mount from an inline JSON block; never written back.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Particle pool size for this preset
    pub fn particle_pool(&self) -> usize {
        match self {
            QualityPreset::Low => 500,
            QualityPreset::Medium => PARTICLE_POOL_SIZE,
            QualityPreset::High => 3000,
        }
    }
}

/// Starfield particle tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Pool size override (None = use quality preset)
    pub pool_size: Option<usize>,
    pub z_max: f64,
    pub velocity: f64,
    pub focal_length: f64,
    pub depth_epsilon: f64,
    pub fade_range: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            pool_size: None,
            z_max: PARTICLE_Z_MAX,
            velocity: PARTICLE_VELOCITY,
            focal_length: PARTICLE_FOCAL_LENGTH,
            depth_epsilon: PARTICLE_DEPTH_EPSILON,
            fade_range: PARTICLE_FADE_RANGE,
        }
    }
}

/// `value` when it is finite and above `floor`, else `fallback`
fn above_or(value: f64, floor: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > floor {
        value
    } else {
        fallback
    }
}

impl ParticleConfig {
    /// Replace out-of-range tuning with the built-in defaults
    pub fn sanitized(self) -> Self {
        Self {
            pool_size: self.pool_size,
            z_max: above_or(self.z_max, 0.0, PARTICLE_Z_MAX),
            velocity: if self.velocity.is_finite() {
                self.velocity.max(0.0)
            } else {
                PARTICLE_VELOCITY
            },
            focal_length: above_or(self.focal_length, 0.0, PARTICLE_FOCAL_LENGTH),
            depth_epsilon: above_or(self.depth_epsilon, 0.0, PARTICLE_DEPTH_EPSILON),
            fade_range: above_or(self.fade_range, 0.0, PARTICLE_FADE_RANGE),
        }
    }
}

/// Force grid tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_size: f64,
    pub height_factor: f64,
    pub radius: f64,
    pub max_displacement: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: GRID_CELL_SIZE,
            height_factor: GRID_HEIGHT_FACTOR,
            radius: GRID_RADIUS,
            max_displacement: GRID_MAX_DISPLACEMENT,
        }
    }
}

impl GridConfig {
    pub fn sanitized(self) -> Self {
        Self {
            cell_size: if self.cell_size.is_finite() && self.cell_size >= MIN_GRID_CELL_SIZE {
                self.cell_size
            } else {
                GRID_CELL_SIZE
            },
            height_factor: above_or(self.height_factor, 0.0, GRID_HEIGHT_FACTOR),
            radius: above_or(self.radius, 0.0, GRID_RADIUS),
            max_displacement: above_or(self.max_displacement, -1.0, GRID_MAX_DISPLACEMENT).max(0.0),
        }
    }
}

/// Terminal typewriter timing (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    pub min_delay_ms: f64,
    pub max_delay_ms: f64,
    pub line_pause_ms: f64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: TYPE_MIN_DELAY_MS,
            max_delay_ms: TYPE_MAX_DELAY_MS,
            line_pause_ms: TYPE_LINE_PAUSE_MS,
        }
    }
}

impl TypewriterConfig {
    /// Non-negative delays with `min <= max`
    pub fn sanitized(self) -> Self {
        let min = above_or(self.min_delay_ms, -1.0, TYPE_MIN_DELAY_MS).max(0.0);
        let max = above_or(self.max_delay_ms, -1.0, TYPE_MAX_DELAY_MS).max(min);
        Self {
            min_delay_ms: min,
            max_delay_ms: max,
            line_pause_ms: above_or(self.line_pause_ms, -1.0, TYPE_LINE_PAUSE_MS).max(0.0),
        }
    }
}

/// Pointer tilt of the hero monolith (degrees, seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    pub max_rotate_y: f64,
    pub base_rotate_x: f64,
    pub rotate_x_range: f64,
    pub duration: f64,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            max_rotate_y: PARALLAX_MAX_ROTATE_Y,
            base_rotate_x: PARALLAX_BASE_ROTATE_X,
            rotate_x_range: PARALLAX_ROTATE_X_RANGE,
            duration: PARALLAX_DURATION,
        }
    }
}

impl ParallaxConfig {
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            max_rotate_y: finite_or(self.max_rotate_y, PARALLAX_MAX_ROTATE_Y),
            base_rotate_x: finite_or(self.base_rotate_x, PARALLAX_BASE_ROTATE_X),
            rotate_x_range: finite_or(self.rotate_x_range, PARALLAX_ROTATE_X_RANGE),
            duration: above_or(self.duration, -1.0, PARALLAX_DURATION).max(0.0),
        }
    }
}

/// All effect settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Graphics quality preset
    pub quality: QualityPreset,
    pub particles: ParticleConfig,
    pub grid: GridConfig,
    pub typewriter: TypewriterConfig,
    pub parallax: ParallaxConfig,
    /// Fixed RNG seed (None = seed from the clock at mount)
    pub seed: Option<u64>,
}

impl EffectsConfig {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Parse settings from JSON; missing or out-of-range fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    pub fn sanitized(self) -> Self {
        Self {
            particles: self.particles.sanitized(),
            grid: self.grid.sanitized(),
            typewriter: self.typewriter.sanitized(),
            parallax: self.parallax.sanitized(),
            ..self
        }
    }

    /// Effective particle pool size
    pub fn particle_pool(&self) -> usize {
        self.particles
            .pool_size
            .unwrap_or_else(|| self.quality.particle_pool())
    }

    /// Inline config element id
    const CONFIG_ELEMENT_ID: &'static str = "fx-config";

    /// Load settings from the page's inline config block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded effect config from #{}", Self::CONFIG_ELEMENT_ID);
                    return config;
                }
                Err(e) => log::warn!("Ignoring malformed effect config: {}", e),
            }
        }

        log::info!("Using default effect config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No #{} on native, using defaults", Self::CONFIG_ELEMENT_ID);
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EffectsConfig::from_json(r#"{"quality":"High","grid":{"radius":200.0}}"#)
            .expect("valid json");
        assert_eq!(config.quality, QualityPreset::High);
        assert_eq!(config.grid.radius, 200.0);
        assert_eq!(config.grid.cell_size, GRID_CELL_SIZE);
        assert_eq!(config.particle_pool(), 3000);
    }

    #[test]
    fn test_pool_override_beats_preset() {
        let mut config = EffectsConfig::from_preset(QualityPreset::Low);
        assert_eq!(config.particle_pool(), 500);
        config.particles.pool_size = Some(42);
        assert_eq!(config.particle_pool(), 42);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(EffectsConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_non_positive_depth_and_fade_fall_back() {
        let config = EffectsConfig::from_json(
            r#"{"particles":{"z_max":-5.0,"fade_range":0.0,"depth_epsilon":0.0,"velocity":-3.0}}"#,
        )
        .expect("valid json");
        assert_eq!(config.particles.z_max, PARTICLE_Z_MAX);
        assert_eq!(config.particles.fade_range, PARTICLE_FADE_RANGE);
        assert_eq!(config.particles.depth_epsilon, PARTICLE_DEPTH_EPSILON);
        assert_eq!(config.particles.velocity, 0.0);
    }

    #[test]
    fn test_tiny_cell_size_falls_back() {
        let grid = GridConfig {
            cell_size: 0.5,
            radius: 0.0,
            ..GridConfig::default()
        }
        .sanitized();
        assert_eq!(grid.cell_size, GRID_CELL_SIZE);
        assert_eq!(grid.radius, GRID_RADIUS);

        let coarse = GridConfig {
            cell_size: MIN_GRID_CELL_SIZE,
            ..GridConfig::default()
        }
        .sanitized();
        assert_eq!(coarse.cell_size, MIN_GRID_CELL_SIZE);
    }

    #[test]
    fn test_typewriter_bounds_are_ordered() {
        let t = TypewriterConfig {
            min_delay_ms: 50.0,
            max_delay_ms: 20.0,
            line_pause_ms: -1.0,
        }
        .sanitized();
        assert_eq!(t.min_delay_ms, 50.0);
        assert_eq!(t.max_delay_ms, 50.0);
        assert_eq!(t.line_pause_ms, 0.0);
    }

    #[test]
    fn test_defaults_survive_sanitizing() {
        assert_eq!(EffectsConfig::default().sanitized(), EffectsConfig::default());
    }
}
