//! Perspective starfield
//!
//! A fixed pool of points flies toward the camera. Each frame every point
//! moves `velocity` units closer; once it passes the camera plane it respawns
//! at maximum depth with a fresh lateral position, so the flight never ends.

use glam::{DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::viewport::Viewport;
use crate::renderer::{RasterSurface, Rgba};
use crate::settings::ParticleConfig;

/// Background painted at the start of every frame (no trails)
pub const BACKGROUND: Rgba = Rgba::rgb(3, 3, 3);
/// Particle fill color; alpha comes from depth
pub const PARTICLE_COLOR: Rgba = Rgba::rgb(255, 0, 60);

/// A point in view-centred space; `z` is depth from the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: DVec3,
}

/// Where and how a particle lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Top-left corner of the painted square (viewport px)
    pub screen: DVec2,
    /// Side length of the painted square
    pub size: f64,
    /// 0 (far) to 1 (near)
    pub opacity: f64,
}

/// The particle pool plus the cached viewport it projects into
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    viewport: Viewport,
    config: ParticleConfig,
    rng: Pcg32,
}

/// Uniform lateral position covering the viewport, centred on the origin
fn random_lateral(rng: &mut Pcg32, viewport: Viewport) -> DVec2 {
    DVec2::new(
        (rng.random::<f64>() - 0.5) * viewport.width,
        (rng.random::<f64>() - 0.5) * viewport.height,
    )
}

impl ParticleField {
    /// Fill a pool of `pool_size` particles at random depths in (0, z_max]
    pub fn new(pool_size: usize, config: ParticleConfig, viewport: Viewport, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let config = config.sanitized();

        let particles = (0..pool_size)
            .map(|_| {
                let lateral = random_lateral(&mut rng, viewport);
                // 1 - [0, 1) keeps depth strictly positive
                let z = config.z_max * (1.0 - rng.random::<f64>());
                Particle {
                    pos: lateral.extend(z),
                }
            })
            .collect();

        log::debug!("Particle pool initialized ({} particles)", pool_size);

        Self {
            particles,
            viewport,
            config,
            rng,
        }
    }

    /// Update the cached dimensions; existing particles are kept as they are
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Advance every particle one frame toward the camera
    pub fn step(&mut self) {
        let velocity = self.config.velocity;
        let z_max = self.config.z_max;
        let viewport = self.viewport;
        let rng = &mut self.rng;

        for particle in self.particles.iter_mut() {
            particle.pos.z -= velocity;
            if particle.pos.z <= 0.0 {
                let lateral = random_lateral(rng, viewport);
                particle.pos = lateral.extend(z_max);
            }
        }
    }

    /// Pinhole projection; None when the viewport has no area
    pub fn project(&self, particle: &Particle) -> Option<Projection> {
        if self.viewport.is_empty() {
            return None;
        }

        let p = self.config.focal_length / (particle.pos.z + self.config.depth_epsilon);
        let center = self.viewport.center();
        let opacity = ((self.config.z_max - particle.pos.z) / self.config.fade_range).clamp(0.0, 1.0);

        Some(Projection {
            screen: center + particle.pos.truncate() * p,
            size: 2.0 * p,
            opacity,
        })
    }

    /// Advance one frame and repaint the whole surface
    pub fn render_frame(&mut self, surface: &mut dyn RasterSurface) {
        self.step();

        if self.viewport.is_empty() {
            return;
        }

        surface.clear(BACKGROUND);
        for particle in &self.particles {
            if let Some(proj) = self.project(particle) {
                surface.fill_rect(
                    proj.screen.x,
                    proj.screen.y,
                    proj.size,
                    proj.size,
                    PARTICLE_COLOR.with_alpha(proj.opacity),
                );
            }
        }
    }
}
