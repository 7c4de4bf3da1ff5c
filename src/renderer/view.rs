//! Projection layer between effect state and page elements
//!
//! Effect modules compute plain data; a `PageView` decides how that data
//! shows up (DOM nodes in the browser, recorded values in tests).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec2;

use super::style::ElementStyle;
use crate::fx::{ChartBar, ElementRef, GridMarker, PropertyName, Rect, TerminalLine};

/// Everything the effects write to (or measure from) the page
pub trait PageView {
    /// Set one animatable property; false when the target is not on the page
    fn set_property(&mut self, target: &ElementRef, property: PropertyName, value: f64) -> bool;

    /// Write out property changes batched since the last flush
    fn flush(&mut self) {}

    /// Discard all marker nodes and create one per marker
    fn rebuild_markers(&mut self, markers: &[GridMarker]);

    /// Move existing marker nodes to their current offsets
    fn update_markers(&mut self, markers: &[GridMarker]);

    /// Show the revealed part of a terminal line (creating it if needed)
    fn show_terminal_line(&mut self, index: usize, line: &TerminalLine);

    /// Pointer position local to spotlight card `card`
    fn set_spotlight(&mut self, card: usize, local: DVec2);

    /// Bounding boxes of the spotlight cards, in viewport px
    fn card_rects(&self) -> Vec<Rect>;

    /// Scroll width of a measured element
    fn content_width(&self, source: &ElementRef) -> Option<f64>;

    /// Toggle the footer reveal state
    fn set_revealed(&mut self, active: bool);

    /// How many elements match `selector`
    fn element_count(&self, selector: &str) -> usize;

    /// Fill the chart area with animated bars; false if there is no chart area
    fn build_chart(&mut self, bars: &[ChartBar], cycle: f64) -> bool;
}

/// In-memory view for tests and headless runs
#[derive(Debug, Default)]
pub struct RecordingView {
    pub styles: HashMap<ElementRef, ElementStyle>,
    pub markers: Vec<GridMarker>,
    pub marker_rebuilds: usize,
    pub marker_updates: usize,
    pub terminal: Vec<String>,
    pub spotlight: Vec<DVec2>,
    pub cards: Vec<Rect>,
    pub content_widths: HashMap<String, f64>,
    pub revealed: bool,
    pub flushes: usize,
    /// Chart bars, None until built (or when the page has no chart area)
    pub chart: Option<Vec<ChartBar>>,
    pub has_chart_area: bool,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// View that knows the given selectors
    pub fn with_elements(selectors: &[&str]) -> Self {
        let mut view = Self::new();
        for s in selectors {
            view.styles.insert(ElementRef::new(*s), ElementStyle::default());
        }
        view
    }

    /// Add `count` individually addressable matches of `selector`
    pub fn with_repeated(mut self, selector: &str, count: usize) -> Self {
        for i in 0..count {
            self.styles.insert(ElementRef::nth(selector, i), ElementStyle::default());
        }
        self
    }

    pub fn with_chart_area(mut self) -> Self {
        self.has_chart_area = true;
        self
    }

    pub fn with_cards(mut self, cards: Vec<Rect>) -> Self {
        self.spotlight = vec![DVec2::ZERO; cards.len()];
        self.cards = cards;
        self
    }

    pub fn with_content_width(mut self, selector: &str, width: f64) -> Self {
        self.content_widths.insert(selector.to_string(), width);
        self
    }

    pub fn property(&self, selector: &str, property: PropertyName) -> Option<f64> {
        self.property_of(&ElementRef::new(selector), property)
    }

    pub fn property_of(&self, target: &ElementRef, property: PropertyName) -> Option<f64> {
        self.styles.get(target).map(|s| s.get(property))
    }
}

impl PageView for RecordingView {
    fn set_property(&mut self, target: &ElementRef, property: PropertyName, value: f64) -> bool {
        match self.styles.get_mut(target) {
            Some(style) => {
                style.set(property, value);
                true
            }
            None => false,
        }
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn rebuild_markers(&mut self, markers: &[GridMarker]) {
        self.markers = markers.to_vec();
        self.marker_rebuilds += 1;
    }

    fn update_markers(&mut self, markers: &[GridMarker]) {
        self.markers = markers.to_vec();
        self.marker_updates += 1;
    }

    fn show_terminal_line(&mut self, index: usize, line: &TerminalLine) {
        if self.terminal.len() <= index {
            self.terminal.resize(index + 1, String::new());
        }
        self.terminal[index] = line.visible_text().to_string();
    }

    fn set_spotlight(&mut self, card: usize, local: DVec2) {
        if let Some(slot) = self.spotlight.get_mut(card) {
            *slot = local;
        }
    }

    fn card_rects(&self) -> Vec<Rect> {
        self.cards.clone()
    }

    fn content_width(&self, source: &ElementRef) -> Option<f64> {
        self.content_widths.get(source.selector()).copied()
    }

    fn set_revealed(&mut self, active: bool) {
        self.revealed = active;
    }

    fn element_count(&self, selector: &str) -> usize {
        self.styles.keys().filter(|k| k.selector() == selector).count()
    }

    fn build_chart(&mut self, bars: &[ChartBar], _cycle: f64) -> bool {
        if !self.has_chart_area {
            return false;
        }
        self.chart = Some(bars.to_vec());
        true
    }
}

/// Shared views let a caller keep inspecting what the runtime wrote
impl<V: PageView> PageView for Rc<RefCell<V>> {
    fn set_property(&mut self, target: &ElementRef, property: PropertyName, value: f64) -> bool {
        self.borrow_mut().set_property(target, property, value)
    }

    fn flush(&mut self) {
        self.borrow_mut().flush();
    }

    fn rebuild_markers(&mut self, markers: &[GridMarker]) {
        self.borrow_mut().rebuild_markers(markers);
    }

    fn update_markers(&mut self, markers: &[GridMarker]) {
        self.borrow_mut().update_markers(markers);
    }

    fn show_terminal_line(&mut self, index: usize, line: &TerminalLine) {
        self.borrow_mut().show_terminal_line(index, line);
    }

    fn set_spotlight(&mut self, card: usize, local: DVec2) {
        self.borrow_mut().set_spotlight(card, local);
    }

    fn card_rects(&self) -> Vec<Rect> {
        self.borrow().card_rects()
    }

    fn content_width(&self, source: &ElementRef) -> Option<f64> {
        self.borrow().content_width(source)
    }

    fn set_revealed(&mut self, active: bool) {
        self.borrow_mut().set_revealed(active);
    }

    fn element_count(&self, selector: &str) -> usize {
        self.borrow().element_count(selector)
    }

    fn build_chart(&mut self, bars: &[ChartBar], cycle: f64) -> bool {
        self.borrow_mut().build_chart(bars, cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::LineKind;

    #[test]
    fn test_unknown_targets_rejected() {
        let mut view = RecordingView::with_elements(&[".a"]);
        assert!(view.set_property(&ElementRef::new(".a"), PropertyName::Scale, 2.0));
        assert!(!view.set_property(&ElementRef::new(".b"), PropertyName::Scale, 2.0));
        assert_eq!(view.property(".a", PropertyName::Scale), Some(2.0));
    }

    #[test]
    fn test_indexed_targets_are_separate() {
        let mut view = RecordingView::new().with_repeated(".block", 2);
        assert_eq!(view.element_count(".block"), 2);
        assert!(view.set_property(&ElementRef::nth(".block", 1), PropertyName::Opacity, 0.5));
        assert!(!view.set_property(&ElementRef::nth(".block", 2), PropertyName::Opacity, 0.5));
        assert_eq!(view.property_of(&ElementRef::nth(".block", 0), PropertyName::Opacity), Some(1.0));
        assert_eq!(view.property_of(&ElementRef::nth(".block", 1), PropertyName::Opacity), Some(0.5));
    }

    #[test]
    fn test_chart_needs_an_area() {
        let bars = [ChartBar { delay: 0.5 }];
        assert!(!RecordingView::new().build_chart(&bars, 3.0));
        let mut view = RecordingView::new().with_chart_area();
        assert!(view.build_chart(&bars, 3.0));
        assert_eq!(view.chart.as_deref(), Some(&bars[..]));
    }

    #[test]
    fn test_terminal_lines_grow_on_demand() {
        let mut view = RecordingView::new();
        let line = TerminalLine::new("ok", LineKind::Success);
        view.show_terminal_line(2, &line);
        assert_eq!(view.terminal, vec![String::new(), String::new(), String::new()]);
    }

    #[test]
    fn test_shared_view_delegates() {
        let shared = Rc::new(RefCell::new(RecordingView::new().with_content_width(".w", 900.0)));
        let mut handle = shared.clone();
        handle.set_revealed(true);
        assert!(shared.borrow().revealed);
        assert_eq!(handle.content_width(&ElementRef::new(".w")), Some(900.0));
    }
}
