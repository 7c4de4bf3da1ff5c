//! Scroll-scrubbed property timeline
//!
//! A timeline is a fixed list of segments. Each segment interpolates one
//! property of one element across a slice of the section's scroll progress.
//! Raw progress (and pinning the section while it is consumed) comes from an
//! external scroll collaborator. A scrubbed timeline does not jump to it: the
//! displayed progress eases toward the latest raw value over the scrub time,
//! advanced by the render loop.
//!
//! Segments are independent: none reads another's output, so registration
//! order only decides which write lands last for a shared property.

use std::fmt;

use super::tween::Tween;
use crate::lerp;
use crate::normalize_progress;
use crate::renderer::PageView;

/// Element(s) a write targets: every match of a selector, or only the nth
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    selector: String,
    index: Option<usize>,
}

impl ElementRef {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            index: None,
        }
    }

    /// The `index`-th match of `selector`, in document order
    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index: Some(index),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.selector, i),
            None => f.write_str(&self.selector),
        }
    }
}

/// Animatable element properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyName {
    /// px
    TranslateX,
    TranslateY,
    TranslateZ,
    /// Percent of the element's own width
    XPercent,
    /// Degrees
    RotateX,
    RotateY,
    Scale,
    Opacity,
    /// Blur radius in px
    Blur,
}

impl PropertyName {
    /// Value of the property on an untouched element
    pub fn rest_value(&self) -> f64 {
        match self {
            PropertyName::Scale | PropertyName::Opacity => 1.0,
            _ => 0.0,
        }
    }
}

/// Easing curves (named after their GSAP counterparts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear
    None,
    /// Quadratic ease-out
    #[default]
    Power1Out,
    /// Quadratic ease-in-out
    Power1InOut,
    /// Cubic ease-out
    Power2Out,
    /// Quartic ease-out (scrub catch-up)
    Power3Out,
}

impl Easing {
    /// Map linear `t` in [0, 1] through the curve
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::None => t,
            Easing::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }
}

/// Measured geometry a timeline depends on
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub viewport_width: f64,
    /// Scroll width of the tracked content, if any
    pub content_width: Option<f64>,
}

impl Layout {
    /// How far the content sticks out past the viewport (may be negative)
    pub fn overflow(&self) -> f64 {
        self.content_width
            .map(|w| w - self.viewport_width)
            .unwrap_or(0.0)
    }
}

/// Segment end value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    Absolute(f64),
    /// Relative to the segment's start value
    Offset(f64),
    /// Horizontal pan that brings the content's right edge to the viewport's
    ContentOverflow,
}

/// One property interpolated over a slice of progress
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSegment {
    pub target: ElementRef,
    pub property: PropertyName,
    pub from: f64,
    pub to: Endpoint,
    /// Progress slice `(start, end)` within [0, 1]
    pub range: (f64, f64),
    pub easing: Easing,
}

impl TimelineSegment {
    /// Segment over the full progress range with the default easing
    pub fn new(target: &str, property: PropertyName, from: f64, to: Endpoint) -> Self {
        Self {
            target: ElementRef::new(target),
            property,
            from,
            to,
            range: (0.0, 1.0),
            easing: Easing::default(),
        }
    }

    /// Segment that starts from the property's rest value
    pub fn to(target: &str, property: PropertyName, to: Endpoint) -> Self {
        Self::new(target, property, property.rest_value(), to)
    }

    pub fn between(mut self, start: f64, end: f64) -> Self {
        self.range = (start, end);
        self
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Concrete end value for the given layout
    pub fn resolve_to(&self, layout: &Layout) -> f64 {
        match self.to {
            Endpoint::Absolute(v) => v,
            Endpoint::Offset(delta) => self.from + delta,
            Endpoint::ContentOverflow => -layout.overflow(),
        }
    }

    /// Interpolated value at `progress` given a resolved end value
    pub fn value_at(&self, progress: f64, to: f64) -> f64 {
        let t = normalize_progress(progress, self.range.0, self.range.1);
        lerp(self.from, to, self.easing.apply(t))
    }
}

/// Scroll distance a pinned section holds for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinDistance {
    /// Fixed number of px
    Fixed(f64),
    /// Content overflow past the viewport (horizontal strips)
    ContentOverflow,
}

/// Pinning request handed to the scroll collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinSpec {
    pub distance: PinDistance,
    /// Seconds the displayed progress takes to catch up (None = follow scroll exactly)
    pub scrub: Option<f64>,
}

/// A computed value for one target property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyWrite {
    pub target: ElementRef,
    pub property: PropertyName,
    pub value: f64,
}

/// Ordered set of writes for one update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFrame {
    writes: Vec<PropertyWrite>,
}

impl PropertyFrame {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, target: &ElementRef, property: PropertyName) -> Option<usize> {
        self.writes
            .iter()
            .position(|w| w.property == property && &w.target == target)
    }

    /// Overwrite (or append) a value
    pub fn set(&mut self, target: &ElementRef, property: PropertyName, value: f64) {
        match self.position(target, property) {
            Some(i) => self.writes[i].value = value,
            None => self.writes.push(PropertyWrite {
                target: target.clone(),
                property,
                value,
            }),
        }
    }

    /// Layer a value on top of whatever is already there
    pub fn add(&mut self, target: &ElementRef, property: PropertyName, value: f64) {
        match self.position(target, property) {
            Some(i) => self.writes[i].value += value,
            None => self.set(target, property, value),
        }
    }

    pub fn get(&self, target: &ElementRef, property: PropertyName) -> Option<f64> {
        self.position(target, property).map(|i| self.writes[i].value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyWrite> {
        self.writes.iter()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Push every write to the view; absent targets are skipped
    pub fn write_to(&self, view: &mut dyn PageView) -> usize {
        let mut applied = 0;
        for w in &self.writes {
            if view.set_property(&w.target, w.property, w.value) {
                applied += 1;
            } else {
                log::debug!("Skipping missing timeline target {}", w.target);
            }
        }
        view.flush();
        applied
    }
}

/// Segments for one scroll-tracked section
#[derive(Debug, Clone, Default)]
pub struct ScrollTimeline {
    segments: Vec<TimelineSegment>,
    registered: bool,
    pin: Option<PinSpec>,
    content_source: Option<ElementRef>,
    layout: Layout,
    resolved_to: Vec<f64>,
    pin_distance: Option<f64>,
    /// Latest raw progress reported by the scroll collaborator
    target_progress: f64,
    /// Eases displayed progress toward `target_progress` when scrubbed
    smoothing: Option<Tween>,
}

impl ScrollTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the section while its progress is consumed
    pub fn pinned(mut self, pin: PinSpec) -> Self {
        self.pin = Some(pin);
        self.smoothing = pin
            .scrub
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| Tween::settled(self.target_progress, s, Easing::Power3Out));
        self
    }

    /// Element whose scroll width feeds `ContentOverflow`
    pub fn measuring(mut self, source: &str) -> Self {
        self.content_source = Some(ElementRef::new(source));
        self
    }

    /// One-time segment setup; later calls are ignored
    pub fn register_segments(&mut self, segments: Vec<TimelineSegment>) -> bool {
        if self.registered {
            log::warn!("Timeline segments already registered, ignoring {} more", segments.len());
            return false;
        }
        self.segments = segments;
        self.registered = true;
        self.resolve();
        true
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    pub fn pin(&self) -> Option<&PinSpec> {
        self.pin.as_ref()
    }

    pub fn content_source(&self) -> Option<&ElementRef> {
        self.content_source.as_ref()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Current pin budget in px (None if unpinned or not yet laid out)
    pub fn pin_distance(&self) -> Option<f64> {
        self.pin_distance
    }

    /// Progress currently shown (lags the target while scrubbing)
    pub fn progress(&self) -> f64 {
        match &self.smoothing {
            Some(tween) => tween.value(),
            None => self.target_progress,
        }
    }

    pub fn target_progress(&self) -> f64 {
        self.target_progress
    }

    pub fn is_scrubbed(&self) -> bool {
        self.smoothing.is_some()
    }

    /// Displayed progress has not caught up with the target yet
    pub fn is_catching_up(&self) -> bool {
        self.smoothing.as_ref().is_some_and(|t| !t.is_done())
    }

    fn resolve(&mut self) {
        let layout = self.layout;
        self.resolved_to = self.segments.iter().map(|s| s.resolve_to(&layout)).collect();
    }

    /// Recompute layout-dependent values; returns the pin budget if it changed
    pub fn invalidate(&mut self, layout: Layout) -> Option<f64> {
        self.layout = layout;
        self.resolve();

        let distance = self.pin.map(|pin| match pin.distance {
            PinDistance::Fixed(d) => d.max(0.0),
            PinDistance::ContentOverflow => layout.overflow().max(0.0),
        });

        if distance != self.pin_distance {
            self.pin_distance = distance;
            distance
        } else {
            None
        }
    }

    /// Values of every segment at `progress`, in registration order
    pub fn sample(&self, progress: f64) -> PropertyFrame {
        let mut frame = PropertyFrame::new();
        for (segment, &to) in self.segments.iter().zip(&self.resolved_to) {
            frame.set(&segment.target, segment.property, segment.value_at(progress, to));
        }
        frame
    }

    /// Record new raw progress; NaN is dropped. A scrubbed timeline starts
    /// easing toward it from wherever it is shown now.
    pub fn set_progress(&mut self, progress: f64) -> bool {
        if progress.is_nan() {
            return false;
        }
        self.target_progress = progress.clamp(0.0, 1.0);
        if let Some(tween) = self.smoothing.as_mut() {
            tween.retarget(self.target_progress);
        }
        true
    }

    /// Move displayed progress `dt` seconds toward the target; true if it moved
    pub fn advance(&mut self, dt: f64) -> bool {
        match self.smoothing.as_mut() {
            Some(tween) if !tween.is_done() => {
                let before = tween.value();
                tween.advance(dt);
                tween.value() != before
            }
            _ => false,
        }
    }

    /// Record progress and write the frame for the displayed progress
    pub fn apply(&mut self, progress: f64, view: &mut dyn PageView) -> usize {
        if !self.set_progress(progress) {
            return 0;
        }
        self.sample(self.progress()).write_to(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingView;
    use proptest::prelude::*;

    fn linear(start: f64, end: f64) -> TimelineSegment {
        TimelineSegment::new(".box", PropertyName::TranslateX, 0.0, Endpoint::Absolute(100.0))
            .between(start, end)
            .eased(Easing::None)
    }

    fn timeline(segments: Vec<TimelineSegment>) -> ScrollTimeline {
        let mut tl = ScrollTimeline::new();
        tl.register_segments(segments);
        tl
    }

    #[test]
    fn test_clamps_outside_range() {
        let tl = timeline(vec![linear(0.2, 0.6)]);
        let target = ElementRef::new(".box");
        let eps = 1e-6;
        assert_eq!(tl.sample(0.2 - eps).get(&target, PropertyName::TranslateX), Some(0.0));
        assert_eq!(tl.sample(0.6 + eps).get(&target, PropertyName::TranslateX), Some(100.0));
        let mid = tl.sample(0.4).get(&target, PropertyName::TranslateX).unwrap_or_default();
        assert!((mid - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::None,
            Easing::Power1Out,
            Easing::Power1InOut,
            Easing::Power2Out,
            Easing::Power3Out,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
        }
        assert!((Easing::Power1InOut.apply(0.5) - 0.5).abs() < 1e-12);
        assert!(Easing::Power2Out.apply(0.5) > 0.5);
        assert!(Easing::Power3Out.apply(0.5) > Easing::Power2Out.apply(0.5));
    }

    #[test]
    fn test_offset_endpoint_is_relative() {
        let seg = TimelineSegment::new(".m", PropertyName::RotateY, 30.0, Endpoint::Offset(120.0));
        assert_eq!(seg.resolve_to(&Layout::default()), 150.0);
    }

    #[test]
    fn test_second_registration_ignored() {
        let mut tl = timeline(vec![linear(0.0, 1.0)]);
        assert!(!tl.register_segments(vec![linear(0.0, 1.0), linear(0.0, 1.0)]));
        assert_eq!(tl.segments().len(), 1);
    }

    #[test]
    fn test_pan_and_pin_follow_content_width() {
        let mut tl = ScrollTimeline::new()
            .pinned(PinSpec {
                distance: PinDistance::ContentOverflow,
                scrub: Some(1.0),
            })
            .measuring(".pin-wrap");
        tl.register_segments(vec![
            TimelineSegment::to(".pin-wrap", PropertyName::TranslateX, Endpoint::ContentOverflow)
                .eased(Easing::None),
        ]);
        let target = ElementRef::new(".pin-wrap");

        let first = tl.invalidate(Layout {
            viewport_width: 1000.0,
            content_width: Some(4000.0),
        });
        assert_eq!(first, Some(3000.0));
        assert_eq!(tl.sample(1.0).get(&target, PropertyName::TranslateX), Some(-3000.0));

        // Same layout again: budget unchanged
        let same = tl.invalidate(tl.layout());
        assert_eq!(same, None);

        // Wider viewport shrinks both the pan and the pin budget
        let resized = tl.invalidate(Layout {
            viewport_width: 1500.0,
            content_width: Some(4000.0),
        });
        assert_eq!(resized, Some(2500.0));
        assert_eq!(tl.sample(1.0).get(&target, PropertyName::TranslateX), Some(-2500.0));
    }

    #[test]
    fn test_pin_budget_never_negative() {
        let mut tl = ScrollTimeline::new().pinned(PinSpec {
            distance: PinDistance::ContentOverflow,
            scrub: None,
        });
        let d = tl.invalidate(Layout {
            viewport_width: 1200.0,
            content_width: Some(800.0),
        });
        assert_eq!(d, Some(0.0));
    }

    #[test]
    fn test_apply_skips_missing_targets() {
        let mut tl = timeline(vec![
            linear(0.0, 1.0),
            TimelineSegment::to(".ghost", PropertyName::Opacity, Endpoint::Absolute(0.0)),
        ]);
        let mut view = RecordingView::with_elements(&[".box"]);
        let applied = tl.apply(0.5, &mut view);
        assert_eq!(applied, 1);
        assert_eq!(view.property(".box", PropertyName::TranslateX), Some(50.0));
        assert_eq!(tl.progress(), 0.5);
    }

    #[test]
    fn test_scrubbed_progress_lags_then_catches_up() {
        let mut tl = ScrollTimeline::new().pinned(PinSpec {
            distance: PinDistance::Fixed(1000.0),
            scrub: Some(1.0),
        });
        tl.register_segments(vec![linear(0.0, 1.0)]);
        assert!(tl.is_scrubbed());

        assert!(tl.set_progress(1.0));
        assert_eq!(tl.target_progress(), 1.0);
        assert_eq!(tl.progress(), 0.0);
        assert!(tl.is_catching_up());

        assert!(tl.advance(0.25));
        let partway = tl.progress();
        assert!(partway > 0.0 && partway < 1.0);

        // New raw value mid-flight eases on from the shown value
        tl.set_progress(0.5);
        assert!((tl.progress() - partway).abs() < 1e-12);

        tl.advance(1.0);
        assert!((tl.progress() - 0.5).abs() < 1e-12);
        assert!(!tl.is_catching_up());
        assert!(!tl.advance(0.1));
    }

    #[test]
    fn test_unscrubbed_progress_is_immediate() {
        let mut tl = ScrollTimeline::new().pinned(PinSpec {
            distance: PinDistance::Fixed(1000.0),
            scrub: None,
        });
        tl.set_progress(0.7);
        assert_eq!(tl.progress(), 0.7);
        assert!(!tl.is_scrubbed());
        assert!(!tl.advance(0.5));
    }

    #[test]
    fn test_nth_target_displays_index() {
        assert_eq!(ElementRef::nth(".feature-block", 2).to_string(), ".feature-block[2]");
        assert_ne!(ElementRef::nth(".a", 0), ElementRef::new(".a"));
        assert_eq!(ElementRef::new(".a").index(), None);
    }

    #[test]
    fn test_frame_add_layers() {
        let target = ElementRef::new(".m");
        let mut frame = PropertyFrame::new();
        frame.set(&target, PropertyName::RotateX, 5.0);
        frame.add(&target, PropertyName::RotateX, 10.0);
        frame.add(&target, PropertyName::RotateY, 3.0);
        assert_eq!(frame.get(&target, PropertyName::RotateX), Some(15.0));
        assert_eq!(frame.get(&target, PropertyName::RotateY), Some(3.0));
        assert_eq!(frame.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_value_between_endpoints(progress in -1.0f64..2.0, start in 0.0f64..0.5, len in 0.0f64..0.5) {
            let tl = timeline(vec![linear(start, start + len)]);
            let v = tl.sample(progress).get(&ElementRef::new(".box"), PropertyName::TranslateX).unwrap_or(-1.0);
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }
}
