//! Effect simulation module
//!
//! Everything here is pure data and math, with no DOM or platform access:
//! - Seeded RNG only
//! - Each input event fully recomputes its output (last write wins)
//! - Visual output goes through `renderer` traits supplied by the caller

pub mod chart;
pub mod entrance;
pub mod grid;
pub mod parallax;
pub mod particles;
pub mod reveal;
pub mod spotlight;
pub mod timeline;
pub mod tween;
pub mod typewriter;
pub mod viewport;

pub use chart::{ChartBar, LiveChart};
pub use entrance::{EntrancePhase, EntranceReveal};
pub use grid::{ForceGrid, GridMarker, MarkerIntensity};
pub use parallax::PointerParallax;
pub use particles::{Particle, ParticleField, Projection};
pub use reveal::RevealToggle;
pub use spotlight::Spotlight;
pub use timeline::{
    Easing, ElementRef, Endpoint, Layout, PinDistance, PinSpec, PropertyFrame, PropertyName,
    PropertyWrite, ScrollTimeline, TimelineSegment,
};
pub use tween::Tween;
pub use typewriter::{LineKind, SequencerPhase, TerminalLine, TypeStep, TypewriterSequencer};
pub use viewport::{Rect, Viewport};
