//! Rendering module
//!
//! Effects never touch the DOM directly. They paint through a [`RasterSurface`]
//! and project element state through a [`PageView`]; both have browser
//! implementations in `web` and recording implementations for tests.

pub mod style;
pub mod surface;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use style::ElementStyle;
pub use surface::{DrawCommand, RasterSurface, RecordingSurface, Rgba};
pub use view::{PageView, RecordingView};
