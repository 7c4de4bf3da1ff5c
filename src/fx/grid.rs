//! Pointer-repulsion dot grid
//!
//! Markers sit on a fixed lattice. A pointer inside `radius` pushes each
//! marker straight away from it, linearly stronger the closer it is. There is
//! no inertia: every pointer event recomputes all offsets from scratch.

use glam::DVec2;

use super::viewport::Viewport;
use crate::settings::GridConfig;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// Visual state of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerIntensity {
    #[default]
    Resting,
    /// Inside the pointer's radius
    Active,
}

/// One lattice dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMarker {
    /// Cell centre in grid-local px (never changes)
    pub home: DVec2,
    /// Current repulsion displacement
    pub offset: DVec2,
    pub intensity: MarkerIntensity,
}

impl GridMarker {
    fn at(home: DVec2) -> Self {
        Self {
            home,
            offset: DVec2::ZERO,
            intensity: MarkerIntensity::Resting,
        }
    }

    /// Displayed position
    pub fn position(&self) -> DVec2 {
        self.home + self.offset
    }

    fn rest(&mut self) {
        self.offset = DVec2::ZERO;
        self.intensity = MarkerIntensity::Resting;
    }
}

/// The marker lattice for one viewport size
#[derive(Debug, Clone)]
pub struct ForceGrid {
    markers: Vec<GridMarker>,
    columns: usize,
    rows: usize,
    config: GridConfig,
}

impl ForceGrid {
    /// Tile `ceil(w / cell) x ceil(height_factor * h / cell)` markers, row-major
    pub fn build(viewport: Viewport, config: GridConfig) -> Self {
        let config = config.sanitized();
        let (columns, rows) = if viewport.is_empty() {
            (0, 0)
        } else {
            (
                (viewport.width / config.cell_size).ceil() as usize,
                (viewport.height * config.height_factor / config.cell_size).ceil() as usize,
            )
        };

        let half = config.cell_size / 2.0;
        let markers = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| (col, row)))
            .map(|(col, row)| {
                GridMarker::at(DVec2::new(
                    col as f64 * config.cell_size + half,
                    row as f64 * config.cell_size + half,
                ))
            })
            .collect::<Vec<_>>();

        log::debug!("Force grid built: {}x{} ({} markers)", columns, rows, markers.len());

        Self {
            markers,
            columns,
            rows,
            config,
        }
    }

    pub fn markers(&self) -> &[GridMarker] {
        &self.markers
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Displacement for a marker at `home` given a pointer in grid-local px
    pub fn displacement(&self, home: DVec2, pointer: DVec2) -> Option<DVec2> {
        let radius = self.config.radius;
        let (dist, angle) = cartesian_to_polar(home - pointer);
        if dist >= radius {
            return None;
        }
        let force = (radius - dist) / radius;
        Some(polar_to_cartesian(force * self.config.max_displacement, angle))
    }

    /// Recompute every marker against the pointer
    pub fn on_pointer_move(&mut self, pointer: DVec2) {
        for i in 0..self.markers.len() {
            match self.displacement(self.markers[i].home, pointer) {
                Some(offset) => {
                    let marker = &mut self.markers[i];
                    marker.offset = offset;
                    marker.intensity = MarkerIntensity::Active;
                }
                None => self.markers[i].rest(),
            }
        }
    }

    /// Pointer left the grid: everything back home
    pub fn clear_pointer(&mut self) {
        self.markers.iter_mut().for_each(GridMarker::rest);
    }

    /// Number of markers currently displaced
    pub fn active_count(&self) -> usize {
        self.markers
            .iter()
            .filter(|m| m.intensity == MarkerIntensity::Active)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::GRID_CELL_SIZE;
    use proptest::prelude::*;

    fn grid() -> ForceGrid {
        ForceGrid::build(Viewport::new(1000.0, 600.0), GridConfig::default())
    }

    #[test]
    fn test_lattice_dimensions() {
        let g = grid();
        // ceil(1000/30) = 34, ceil(900/30) = 30
        assert_eq!(g.dimensions(), (34, 30));
        assert_eq!(g.markers().len(), 34 * 30);
        assert_eq!(g.markers()[0].home, DVec2::new(15.0, 15.0));
        assert_eq!(g.markers()[35].home, DVec2::new(45.0, 45.0));
    }

    #[test]
    fn test_tiny_cell_size_uses_default_spacing() {
        let config = GridConfig {
            cell_size: 0.01,
            ..GridConfig::default()
        };
        let g = ForceGrid::build(Viewport::new(1000.0, 600.0), config);
        assert_eq!(g.config().cell_size, GRID_CELL_SIZE);
        assert_eq!(g.dimensions(), (34, 30));
    }

    #[test]
    fn test_empty_viewport_builds_no_markers() {
        let g = ForceGrid::build(Viewport::new(0.0, 600.0), GridConfig::default());
        assert!(g.markers().is_empty());
    }

    #[test]
    fn test_marker_under_pointer_gets_max_displacement() {
        let mut g = grid();
        let home = g.markers()[0].home;
        g.on_pointer_move(home);
        let m = g.markers()[0];
        assert_eq!(m.intensity, MarkerIntensity::Active);
        assert!((m.offset.length() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_push_is_away_from_pointer() {
        let mut g = grid();
        let home = g.markers()[40].home;
        g.on_pointer_move(home - DVec2::new(100.0, 0.0));
        let m = g.markers()[40];
        assert!(m.offset.x > 0.0);
        assert!(m.offset.y.abs() < 1e-9);
        // force = (350 - 100) / 350
        assert!((m.offset.length() - 50.0 * 250.0 / 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_far_markers_rest_and_events_do_not_accumulate() {
        let mut g = grid();
        g.on_pointer_move(DVec2::new(15.0, 15.0));
        assert!(g.active_count() > 0);

        g.on_pointer_move(DVec2::new(5000.0, 5000.0));
        assert_eq!(g.active_count(), 0);
        assert!(g.markers().iter().all(|m| m.offset == DVec2::ZERO));
    }

    #[test]
    fn test_clear_pointer_resets() {
        let mut g = grid();
        g.on_pointer_move(DVec2::new(300.0, 300.0));
        g.clear_pointer();
        assert_eq!(g.active_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_offset_bounded_and_zero_outside_radius(px in -500.0f64..1500.0, py in -500.0f64..1500.0) {
            let mut g = grid();
            let pointer = DVec2::new(px, py);
            g.on_pointer_move(pointer);
            for m in g.markers() {
                let dist = m.home.distance(pointer);
                if dist >= 350.0 {
                    prop_assert_eq!(m.offset, DVec2::ZERO);
                    prop_assert_eq!(m.intensity, MarkerIntensity::Resting);
                } else {
                    prop_assert!(m.offset.length() <= 50.0 + 1e-9);
                }
            }
        }
    }
}
