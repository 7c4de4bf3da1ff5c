//! Browser renderers: a 2D canvas surface and a DOM-backed page view

use std::collections::{HashMap, HashSet};

use glam::DVec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement};

use super::style::ElementStyle;
use super::surface::{RasterSurface, Rgba};
use super::view::PageView;
use crate::fx::{
    ChartBar, ElementRef, GridMarker, LineKind, MarkerIntensity, PropertyName, Rect, TerminalLine,
    Viewport,
};
use crate::page;

/// Particle canvas
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas2dSurface {
    /// Look up a canvas by id and grab its 2D context
    pub fn from_id(document: &Document, id: &str) -> Option<Self> {
        let canvas = document
            .get_element_by_id(id)?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }
}

impl RasterSurface for Canvas2dSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.canvas.set_width(viewport.width as u32);
        self.canvas.set_height(viewport.height as u32);
    }

    fn clear(&mut self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(x, y, w, h);
    }
}

const MARKER_RESTING: &str = "#333";
const MARKER_ACTIVE: &str = "#555";

fn marker_color(intensity: MarkerIntensity) -> &'static str {
    match intensity {
        MarkerIntensity::Resting => MARKER_RESTING,
        MarkerIntensity::Active => MARKER_ACTIVE,
    }
}

fn line_color(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Command | LineKind::BlinkingCommand => "#fff",
        LineKind::Success => "#ff003c",
        LineKind::Log => "#888",
    }
}

/// Writes effect state into the live document
pub struct DomView {
    document: Document,
    /// Last written style per target
    styles: HashMap<ElementRef, ElementStyle>,
    dirty: HashSet<ElementRef>,
    markers: Vec<HtmlElement>,
    lines: Vec<HtmlElement>,
}

impl DomView {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            styles: HashMap::new(),
            dirty: HashSet::new(),
            markers: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn create_div(&self) -> Option<HtmlElement> {
        self.document
            .create_element("div")
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn matching(&self, target: &ElementRef) -> Vec<HtmlElement> {
        let Ok(nodes) = self.document.query_selector_all(target.selector()) else {
            return Vec::new();
        };
        let picked = match target.index() {
            Some(i) => i as u32..(i as u32).saturating_add(1),
            None => 0..nodes.length(),
        };
        picked
            .filter_map(|i| nodes.item(i))
            .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn cards(&self) -> Vec<HtmlElement> {
        let Some(container) = self.document.get_element_by_id(page::CARDS_CONTAINER) else {
            return Vec::new();
        };
        let cards = container.get_elements_by_class_name(page::TECH_CARD_CLASS);
        (0..cards.length())
            .filter_map(|i| cards.item(i))
            .filter_map(|e| e.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn place_marker(el: &HtmlElement, marker: &GridMarker) {
        let style = el.style();
        let _ = style.set_property(
            "transform",
            &format!("translate({}px, {}px)", marker.offset.x, marker.offset.y),
        );
        let _ = style.set_property("background", marker_color(marker.intensity));
    }
}

impl PageView for DomView {
    fn set_property(&mut self, target: &ElementRef, property: PropertyName, value: f64) -> bool {
        if !self.styles.contains_key(target) {
            if self.matching(target).is_empty() {
                return false;
            }
            // New targets flush once even if the value equals the default
            self.styles.insert(target.clone(), ElementStyle::default());
            self.dirty.insert(target.clone());
        }

        if let Some(style) = self.styles.get_mut(target) {
            if style.get(property) != value {
                style.set(property, value);
                self.dirty.insert(target.clone());
            }
        }
        true
    }

    fn flush(&mut self) {
        let dirty: Vec<ElementRef> = self.dirty.drain().collect();
        for target in dirty {
            let Some(style) = self.styles.get(&target) else {
                continue;
            };
            let transform = style.transform_css();
            let filter = style.filter_css();
            let opacity = style.opacity_css();

            for el in self.matching(&target) {
                let css = el.style();
                let _ = css.set_property("transform", &transform);
                let _ = css.set_property("filter", &filter);
                let _ = css.set_property("opacity", &opacity);
            }
        }
    }

    fn rebuild_markers(&mut self, markers: &[GridMarker]) {
        let Some(grid) = self.document.get_element_by_id(page::NEURAL_GRID) else {
            log::warn!("#{} missing, grid markers not shown", page::NEURAL_GRID);
            return;
        };
        grid.set_inner_html("");
        self.markers.clear();

        for marker in markers {
            let Some(el) = self.create_div() else {
                continue;
            };
            let style = el.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("left", &format!("{}px", marker.home.x));
            let _ = style.set_property("top", &format!("{}px", marker.home.y));
            let _ = style.set_property("width", "2px");
            let _ = style.set_property("height", "2px");
            let _ = style.set_property("border-radius", "50%");
            let _ = style.set_property("transition", "transform 0.1s ease-out, background 0.2s");
            let _ = style.set_property("will-change", "transform");
            Self::place_marker(&el, marker);
            let _ = grid.append_child(&el);
            self.markers.push(el);
        }
        log::debug!("Grid markers rebuilt ({})", self.markers.len());
    }

    fn update_markers(&mut self, markers: &[GridMarker]) {
        for (el, marker) in self.markers.iter().zip(markers) {
            Self::place_marker(el, marker);
        }
    }

    fn show_terminal_line(&mut self, index: usize, line: &TerminalLine) {
        while self.lines.len() <= index {
            let Some(output) = self.document.get_element_by_id(page::TERMINAL_OUTPUT) else {
                return;
            };
            let Some(el) = self.create_div() else {
                return;
            };
            el.set_id(&format!("line-{}", self.lines.len()));
            let style = el.style();
            let _ = style.set_property("margin-bottom", "0.8rem");
            let _ = style.set_property("display", "flex");
            let _ = style.set_property("min-height", "1.5em");
            let _ = style.set_property("font-family", "'Courier New', monospace");
            let _ = style.set_property("color", line_color(line.kind));
            let _ = output.append_child(&el);
            self.lines.push(el);
        }

        if let Some(el) = self.lines.get(index) {
            el.set_text_content(Some(line.visible_text()));
        }
    }

    fn set_spotlight(&mut self, card: usize, local: DVec2) {
        if let Some(el) = self.cards().get(card) {
            let style = el.style();
            let _ = style.set_property("--mouse-x", &format!("{}px", local.x));
            let _ = style.set_property("--mouse-y", &format!("{}px", local.y));
        }
    }

    fn card_rects(&self) -> Vec<Rect> {
        self.cards()
            .iter()
            .map(|card| {
                let r = card.get_bounding_client_rect();
                Rect::new(r.left(), r.top(), r.width(), r.height())
            })
            .collect()
    }

    fn content_width(&self, source: &ElementRef) -> Option<f64> {
        self.document
            .query_selector(source.selector())
            .ok()
            .flatten()
            .map(|el: Element| el.scroll_width() as f64)
    }

    fn set_revealed(&mut self, active: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let classes = body.class_list();
        let _ = if active {
            classes.add_1(page::REVEAL_CLASS)
        } else {
            classes.remove_1(page::REVEAL_CLASS)
        };
    }

    fn element_count(&self, selector: &str) -> usize {
        self.document
            .query_selector_all(selector)
            .map(|nodes| nodes.length() as usize)
            .unwrap_or(0)
    }

    fn build_chart(&mut self, bars: &[ChartBar], cycle: f64) -> bool {
        let Some(area) = self.document.get_element_by_id(page::LIVE_CHART) else {
            log::warn!("#{} missing, live chart not shown", page::LIVE_CHART);
            return false;
        };

        for bar in bars {
            let Some(el) = self.create_div() else {
                continue;
            };
            let _ = el.class_list().add_1(page::CHART_BAR_CLASS);
            let style = el.style();
            let _ = style.set_property("flex", "1");
            let _ = style.set_property(
                "background",
                "linear-gradient(0deg, #ff003c 0%, transparent 100%)",
            );
            let _ = style.set_property("opacity", "0.3");
            let _ = style.set_property("border-top", "1px solid #ff003c");
            let _ = style.set_property(
                "animation",
                &format!("chartMove {}s infinite ease-in-out", cycle),
            );
            let _ = style.set_property("animation-delay", &format!("{}s", bar.delay));
            let _ = area.append_child(&el);
        }
        log::debug!("Live chart built ({} bars)", bars.len());
        true
    }
}
