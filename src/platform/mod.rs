//! Platform abstraction layer
//!
//! The runtime never reaches for globals. Every outside capability is
//! injected as one of these traits and every registration hands back a
//! handle, so teardown can prove it released everything:
//! - Frames: display-refresh callbacks
//! - Delays: one-shot timers
//! - Events: pointer/resize/layout listeners
//! - Pins: scroll triggers that pin sections and report progress
//!
//! `manual` drives all four deterministically (tests, native runs);
//! `web` binds them to the browser. `bridge` queues host callbacks that
//! arrive while the runtime is busy.

pub mod bridge;
pub mod manual;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{Bridge, Delivery};
pub use manual::ManualHost;

use glam::DVec2;

use crate::fx::Viewport;
use crate::page::SectionId;

/// Id of a pending frame or timer callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(pub u64);

/// Id of a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub kind: EventKind,
}

/// Id of a registered scroll trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinHandle {
    pub id: u64,
    pub section: SectionId,
}

/// Listener categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer anywhere in the document
    PointerMove,
    /// Pointer over the force grid section
    GridPointer,
    /// Pointer over the spotlight cards
    CardsPointer,
    Resize,
    /// Page layout was recomputed (scroll collaborator refresh)
    Layout,
}

/// Inputs delivered to the runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Viewport px
    PointerMove(DVec2),
    /// Grid-local px
    GridPointer(DVec2),
    /// Pointer left the grid section
    GridPointerLeave,
    /// Viewport px
    CardsPointer(DVec2),
    Resize(Viewport),
    /// Tracked content changed size without a viewport resize
    LayoutChanged,
    /// Normalized progress of a pinned/scrubbed section
    ScrollProgress { section: SectionId, progress: f64 },
    SectionEntered(SectionId),
    SectionLeftBack(SectionId),
}

impl InputEvent {
    /// Listener kind this event arrives through (None = scroll collaborator)
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            InputEvent::PointerMove(_) => Some(EventKind::PointerMove),
            InputEvent::GridPointer(_) | InputEvent::GridPointerLeave => {
                Some(EventKind::GridPointer)
            }
            InputEvent::CardsPointer(_) => Some(EventKind::CardsPointer),
            InputEvent::Resize(_) => Some(EventKind::Resize),
            InputEvent::LayoutChanged => Some(EventKind::Layout),
            InputEvent::ScrollProgress { .. }
            | InputEvent::SectionEntered(_)
            | InputEvent::SectionLeftBack(_) => None,
        }
    }

    /// Section this event is reported for, if it comes from a scroll trigger
    pub fn section(&self) -> Option<SectionId> {
        match self {
            InputEvent::ScrollProgress { section, .. }
            | InputEvent::SectionEntered(section)
            | InputEvent::SectionLeftBack(section) => Some(*section),
            _ => None,
        }
    }
}

/// Scroll trigger registration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerSpec {
    pub section: SectionId,
    /// "<element edge> <viewport edge>"
    pub start: &'static str,
    /// Scroll distance the trigger spans (None = instant enter/leave only)
    pub distance: Option<f64>,
    /// Hold the section in place while `distance` is consumed
    pub pin: bool,
    /// Fire enter once then stop tracking
    pub once: bool,
}

impl TriggerSpec {
    /// Plain enter/leave trigger for a section
    pub fn watch(section: SectionId) -> Self {
        Self {
            section,
            start: section.trigger_start(),
            distance: None,
            pin: false,
            once: false,
        }
    }
}

/// Display-refresh callbacks
pub trait FrameScheduler {
    /// Ask for one callback on the next refresh
    fn request_frame(&mut self) -> CallbackHandle;
    fn cancel_frame(&mut self, handle: CallbackHandle);
}

/// One-shot delayed callbacks
pub trait DelayScheduler {
    fn schedule(&mut self, delay_ms: f64) -> CallbackHandle;
    fn cancel(&mut self, handle: CallbackHandle);
}

/// Pointer/resize/layout listeners
pub trait EventSource {
    fn subscribe(&mut self, kind: EventKind) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
}

/// Scroll-tracking and pinning collaborator
pub trait ScrollPinner {
    fn register(&mut self, spec: TriggerSpec) -> PinHandle;
    /// Change the scroll distance a registered trigger spans
    fn set_distance(&mut self, handle: PinHandle, distance: f64);
    fn release(&mut self, handle: PinHandle);
}
