//! Effects runtime: activation, event routing and teardown
//!
//! Owns every effect plus the collaborators they run on. Activation
//! registers listeners, scroll triggers and the render loop; teardown
//! releases every one of them, after which no frame, timer or event can
//! change state.

use glam::DVec2;

use crate::consts::MAX_FRAME_DT;
use crate::fx::{
    EntranceReveal, ForceGrid, Layout, LiveChart, ParticleField, PointerParallax, PropertyFrame,
    RevealToggle, ScrollTimeline, Spotlight, TypeStep, TypewriterSequencer, Viewport,
};
use crate::page::{self, SectionId};
use crate::platform::{
    CallbackHandle, DelayScheduler, EventKind, EventSource, FrameScheduler, InputEvent,
    ManualHost, PinHandle, ScrollPinner, Subscription, TriggerSpec,
};
use crate::renderer::{PageView, RasterSurface};
use crate::settings::EffectsConfig;

/// Listener kinds held while active
const LISTENED: [EventKind; 5] = [
    EventKind::PointerMove,
    EventKind::GridPointer,
    EventKind::CardsPointer,
    EventKind::Resize,
    EventKind::Layout,
];

/// Everything the runtime talks to outside itself
pub struct Collaborators {
    pub frames: Box<dyn FrameScheduler>,
    pub timers: Box<dyn DelayScheduler>,
    pub events: Box<dyn EventSource>,
    pub pins: Box<dyn ScrollPinner>,
    /// None when no 2D context is available (particles then run unpainted)
    pub surface: Option<Box<dyn RasterSurface>>,
    pub view: Box<dyn PageView>,
}

impl Collaborators {
    /// Wire every scheduler/source to one manual host
    pub fn manual(
        host: &ManualHost,
        surface: Option<Box<dyn RasterSurface>>,
        view: Box<dyn PageView>,
    ) -> Self {
        Self {
            frames: Box::new(host.clone()),
            timers: Box::new(host.clone()),
            events: Box::new(host.clone()),
            pins: Box::new(host.clone()),
            surface,
            view,
        }
    }
}

/// Proof of a running render loop; hand it back to stop that loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePhase {
    Inactive,
    Active,
    /// Terminal; nothing is registered any more
    TornDown,
}

#[derive(Debug)]
struct RenderLoop {
    token: FrameToken,
    pending: Option<CallbackHandle>,
    last_time: Option<f64>,
}

struct SectionTimeline {
    section: SectionId,
    timeline: ScrollTimeline,
    pin: Option<PinHandle>,
}

struct SectionEntrance {
    section: SectionId,
    reveal: EntranceReveal,
    pin: Option<PinHandle>,
}

/// All page effects and their lifecycle
pub struct EffectsRuntime {
    config: EffectsConfig,
    viewport: Viewport,
    particles: ParticleField,
    grid: ForceGrid,
    timelines: Vec<SectionTimeline>,
    /// Built at activation, once the page can be counted
    entrances: Vec<SectionEntrance>,
    chart: LiveChart,
    parallax: PointerParallax,
    typewriter: TypewriterSequencer,
    spotlight: Spotlight,
    footer: RevealToggle,
    host: Collaborators,
    phase: RuntimePhase,
    render_loop: Option<RenderLoop>,
    next_token: u64,
    typing_timer: Option<CallbackHandle>,
    subscriptions: Vec<Subscription>,
    watch_pins: Vec<PinHandle>,
    frames_rendered: u64,
}

impl EffectsRuntime {
    /// Build every effect for `viewport`; nothing runs until `activate`
    pub fn new(config: EffectsConfig, viewport: Viewport, host: Collaborators, seed: u64) -> Self {
        let seed = config.seed.unwrap_or(seed);

        let particles = ParticleField::new(config.particle_pool(), config.particles, viewport, seed);
        let grid = ForceGrid::build(viewport, config.grid);
        let typewriter = TypewriterSequencer::new(
            page::terminal_script(),
            config.typewriter,
            seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        );
        let chart = LiveChart::new(
            page::CHART_BARS,
            page::CHART_MAX_DELAY,
            page::CHART_CYCLE,
            seed.wrapping_add(0xD1B5_4A32_D192_ED03),
        );
        let timelines = vec![
            SectionTimeline {
                section: SectionId::Hero,
                timeline: page::hero_timeline(),
                pin: None,
            },
            SectionTimeline {
                section: SectionId::Pipeline,
                timeline: page::pipeline_timeline(),
                pin: None,
            },
        ];

        Self {
            parallax: PointerParallax::new(page::MONOLITH, config.parallax),
            config,
            viewport,
            particles,
            grid,
            timelines,
            entrances: Vec::new(),
            chart,
            typewriter,
            spotlight: Spotlight::new(),
            footer: RevealToggle::new(),
            host,
            phase: RuntimePhase::Inactive,
            render_loop: None,
            next_token: 0,
            typing_timer: None,
            subscriptions: Vec::new(),
            watch_pins: Vec::new(),
            frames_rendered: 0,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> RuntimePhase {
        self.phase
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn grid(&self) -> &ForceGrid {
        &self.grid
    }

    pub fn typewriter(&self) -> &TypewriterSequencer {
        &self.typewriter
    }

    pub fn parallax(&self) -> &PointerParallax {
        &self.parallax
    }

    pub fn spotlight(&self) -> &Spotlight {
        &self.spotlight
    }

    pub fn footer_revealed(&self) -> bool {
        self.footer.is_active()
    }

    pub fn timeline(&self, section: SectionId) -> Option<&ScrollTimeline> {
        self.timelines
            .iter()
            .find(|st| st.section == section)
            .map(|st| &st.timeline)
    }

    pub fn chart(&self) -> &LiveChart {
        &self.chart
    }

    /// Entrance animation for a section, once activated
    pub fn entrance(&self, section: SectionId) -> Option<&EntranceReveal> {
        self.entrances
            .iter()
            .find(|e| e.section == section)
            .map(|e| &e.reveal)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_rendering(&self) -> bool {
        self.render_loop.is_some()
    }

    // === Lifecycle ===

    /// Register listeners, scroll triggers and the render loop
    pub fn activate(&mut self) {
        if self.phase != RuntimePhase::Inactive {
            log::warn!("activate() called in {:?}, ignoring", self.phase);
            return;
        }
        self.phase = RuntimePhase::Active;

        for kind in LISTENED {
            let sub = self.host.events.subscribe(kind);
            self.subscriptions.push(sub);
        }

        if let Some(surface) = self.host.surface.as_mut() {
            surface.resize(self.viewport);
        } else {
            log::warn!("No raster surface; particles will not be painted");
        }
        self.host.view.rebuild_markers(self.grid.markers());

        self.refresh_layout();
        for st in self.timelines.iter_mut() {
            if st.timeline.pin().is_none() {
                continue;
            }
            let spec = TriggerSpec {
                section: st.section,
                start: st.section.trigger_start(),
                distance: st.timeline.pin_distance(),
                pin: true,
                once: false,
            };
            st.pin = Some(self.host.pins.register(spec));
        }

        self.build_entrances();
        if !self.host.view.build_chart(self.chart.bars(), self.chart.cycle()) {
            log::debug!("No chart area on this page");
        }

        let terminal = TriggerSpec {
            once: true,
            ..TriggerSpec::watch(SectionId::Terminal)
        };
        self.watch_pins.push(self.host.pins.register(terminal));
        self.watch_pins
            .push(self.host.pins.register(TriggerSpec::watch(SectionId::Footer)));

        for section in [SectionId::Hero, SectionId::Pipeline] {
            self.apply_section(section);
        }

        self.start_rendering();

        log::info!(
            "Effects active ({}x{}, {} particles, {} grid markers)",
            self.viewport.width,
            self.viewport.height,
            self.particles.particles().len(),
            self.grid.markers().len()
        );
    }

    /// Release everything `activate` registered; safe to call more than once
    pub fn teardown(&mut self) {
        match self.phase {
            RuntimePhase::TornDown => return,
            RuntimePhase::Inactive => {
                self.phase = RuntimePhase::TornDown;
                return;
            }
            RuntimePhase::Active => {}
        }

        if let Some(render_loop) = self.render_loop.take() {
            if let Some(pending) = render_loop.pending {
                self.host.frames.cancel_frame(pending);
            }
        }

        if let Some(timer) = self.typing_timer.take() {
            self.host.timers.cancel(timer);
        }

        for sub in self.subscriptions.drain(..) {
            self.host.events.unsubscribe(sub);
        }

        for st in self.timelines.iter_mut() {
            if let Some(pin) = st.pin.take() {
                self.host.pins.release(pin);
            }
        }
        for pin in self.watch_pins.drain(..) {
            self.host.pins.release(pin);
        }
        for entrance in self.entrances.iter_mut() {
            if let Some(pin) = entrance.pin.take() {
                self.host.pins.release(pin);
            }
        }

        self.phase = RuntimePhase::TornDown;
        log::info!("Effects torn down after {} frames", self.frames_rendered);
    }

    // === Render loop ===

    /// Start the frame loop (or return the token of the running one)
    pub fn start_rendering(&mut self) -> Option<FrameToken> {
        if self.phase != RuntimePhase::Active {
            return None;
        }
        if let Some(render_loop) = &self.render_loop {
            return Some(render_loop.token);
        }

        self.next_token += 1;
        let token = FrameToken(self.next_token);
        let pending = self.host.frames.request_frame();
        self.render_loop = Some(RenderLoop {
            token,
            pending: Some(pending),
            last_time: None,
        });
        Some(token)
    }

    /// Stop the loop `token` belongs to; stale tokens are ignored
    pub fn stop_rendering(&mut self, token: FrameToken) -> bool {
        match &self.render_loop {
            Some(render_loop) if render_loop.token == token => {}
            _ => {
                log::debug!("stop_rendering with stale token {:?}", token);
                return false;
            }
        }

        if let Some(pending) = self.render_loop.take().and_then(|l| l.pending) {
            self.host.frames.cancel_frame(pending);
        }
        true
    }

    /// Display refresh callback; `time_ms` is the frame timestamp
    pub fn on_frame(&mut self, handle: CallbackHandle, time_ms: f64) -> bool {
        if self.phase != RuntimePhase::Active {
            return false;
        }
        let dt = match self.render_loop.as_mut() {
            Some(render_loop) if render_loop.pending == Some(handle) => {
                let dt = render_loop
                    .last_time
                    .map(|last| ((time_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT))
                    .unwrap_or(0.0);
                render_loop.last_time = Some(time_ms);
                render_loop.pending = None;
                dt
            }
            _ => {
                log::debug!("Dropping stale frame callback {:?}", handle);
                return false;
            }
        };

        match self.host.surface.as_mut() {
            Some(surface) => self.particles.render_frame(surface.as_mut()),
            None => self.particles.step(),
        }

        let mut moved: Vec<SectionId> = self
            .timelines
            .iter_mut()
            .filter_map(|st| st.timeline.advance(dt).then_some(st.section))
            .collect();
        let tilting = !self.parallax.is_settled();
        self.parallax.advance(dt);
        if tilting && !moved.contains(&SectionId::Hero) {
            moved.push(SectionId::Hero);
        }
        for section in moved {
            self.apply_section(section);
        }

        self.advance_entrances(dt);

        self.frames_rendered += 1;

        let next = self.host.frames.request_frame();
        if let Some(render_loop) = self.render_loop.as_mut() {
            render_loop.pending = Some(next);
        }
        true
    }

    // === Typewriter ===

    /// Delayed callback for the typewriter
    pub fn on_timer(&mut self, handle: CallbackHandle) -> bool {
        if self.phase != RuntimePhase::Active || self.typing_timer != Some(handle) {
            log::debug!("Dropping stale timer callback {:?}", handle);
            return false;
        }
        self.typing_timer = None;
        let step = self.typewriter.tick();
        self.follow_type_step(step);
        true
    }

    fn follow_type_step(&mut self, step: TypeStep) {
        if let Some(index) = step.line {
            if let Some(line) = self.typewriter.lines().get(index) {
                self.host.view.show_terminal_line(index, line);
            }
        }
        if let Some(delay) = step.next_delay {
            self.typing_timer = Some(self.host.timers.schedule(delay));
        }
    }

    // === Events ===

    fn has_live_pin(&self, section: SectionId) -> bool {
        self.timelines
            .iter()
            .any(|st| st.section == section && st.pin.is_some())
            || self.watch_pins.iter().any(|p| p.section == section)
            || self
                .entrances
                .iter()
                .any(|e| e.section == section && e.pin.is_some())
    }

    /// Route one input event; returns false if it was not accepted
    pub fn dispatch(&mut self, event: InputEvent) -> bool {
        if self.phase != RuntimePhase::Active {
            return false;
        }
        if let Some(kind) = event.kind() {
            if !self.subscriptions.iter().any(|s| s.kind == kind) {
                return false;
            }
        }
        if let Some(section) = event.section() {
            if !self.has_live_pin(section) {
                return false;
            }
        }

        match event {
            InputEvent::PointerMove(pointer) => {
                self.parallax.on_pointer_move(pointer, self.viewport);
            }
            InputEvent::GridPointer(pointer) => {
                self.grid.on_pointer_move(pointer);
                self.host.view.update_markers(self.grid.markers());
            }
            InputEvent::GridPointerLeave => {
                self.grid.clear_pointer();
                self.host.view.update_markers(self.grid.markers());
            }
            InputEvent::CardsPointer(pointer) => self.update_spotlight(pointer),
            InputEvent::Resize(viewport) => self.on_resize(viewport),
            InputEvent::LayoutChanged => {
                self.refresh_layout();
                for section in [SectionId::Hero, SectionId::Pipeline] {
                    self.apply_section(section);
                }
            }
            InputEvent::ScrollProgress { section, progress } => {
                let Some(st) = self.timelines.iter_mut().find(|st| st.section == section) else {
                    return false;
                };
                if !st.timeline.set_progress(progress) {
                    return false;
                }
                // Scrubbed timelines catch up on the next frames
                if !st.timeline.is_scrubbed() {
                    self.apply_section(section);
                }
            }
            InputEvent::SectionEntered(SectionId::Terminal) => {
                let step = self.typewriter.start();
                self.follow_type_step(step);
            }
            InputEvent::SectionEntered(section @ (SectionId::Dev | SectionId::FeatureBlock(_))) => {
                let Some(entrance) = self.entrances.iter_mut().find(|e| e.section == section)
                else {
                    return false;
                };
                if !entrance.reveal.play() {
                    log::debug!("{:?} entrance already played", section);
                }
            }
            InputEvent::SectionEntered(SectionId::Footer) => {
                if let Some(active) = self.footer.enter() {
                    self.host.view.set_revealed(active);
                }
            }
            InputEvent::SectionLeftBack(SectionId::Footer) => {
                if let Some(active) = self.footer.leave_back() {
                    self.host.view.set_revealed(active);
                }
            }
            InputEvent::SectionEntered(_) | InputEvent::SectionLeftBack(_) => return false,
        }
        true
    }

    // === Entrances ===

    /// One code card reveal plus one per feature block on the page; every
    /// target starts hidden and its trigger fires once
    fn build_entrances(&mut self) {
        let blocks = self.host.view.element_count(page::FEATURE_BLOCK);
        let reveals = std::iter::once((SectionId::Dev, page::code_card_reveal())).chain(
            (0..blocks).map(|i| (SectionId::FeatureBlock(i), page::feature_block_reveal(i))),
        );

        let mut hidden = PropertyFrame::new();
        for (section, reveal) in reveals {
            reveal.write_onto(&mut hidden);
            let spec = TriggerSpec {
                once: true,
                ..TriggerSpec::watch(section)
            };
            let pin = Some(self.host.pins.register(spec));
            self.entrances.push(SectionEntrance {
                section,
                reveal,
                pin,
            });
        }
        hidden.write_to(self.host.view.as_mut());
        log::debug!("Entrance animations armed ({} feature blocks)", blocks);
    }

    fn advance_entrances(&mut self, dt: f64) {
        let mut frame = PropertyFrame::new();
        for entrance in self.entrances.iter_mut() {
            if entrance.reveal.is_animating() && entrance.reveal.advance(dt) {
                entrance.reveal.write_onto(&mut frame);
            }
        }
        if !frame.is_empty() {
            frame.write_to(self.host.view.as_mut());
        }
    }

    fn update_spotlight(&mut self, pointer: DVec2) {
        let cards = self.host.view.card_rects();
        let local = self.spotlight.update(pointer, &cards);
        for (i, pos) in local.iter().enumerate() {
            self.host.view.set_spotlight(i, *pos);
        }
    }

    /// New viewport: cache first, then everything derived from it
    fn on_resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;

        self.particles.resize(viewport);
        if let Some(surface) = self.host.surface.as_mut() {
            surface.resize(viewport);
        }

        self.grid = ForceGrid::build(viewport, self.config.grid);
        self.host.view.rebuild_markers(self.grid.markers());

        self.refresh_layout();
        for section in [SectionId::Hero, SectionId::Pipeline] {
            self.apply_section(section);
        }

        log::debug!("Resized to {}x{}", viewport.width, viewport.height);
    }

    /// Re-measure tracked content and push changed pin budgets out
    fn refresh_layout(&mut self) {
        let viewport_width = self.viewport.width;
        for st in self.timelines.iter_mut() {
            let content_width = st
                .timeline
                .content_source()
                .and_then(|source| self.host.view.content_width(source));
            let layout = Layout {
                viewport_width,
                content_width,
            };

            if let Some(distance) = st.timeline.invalidate(layout) {
                if let Some(pin) = st.pin {
                    self.host.pins.set_distance(pin, distance);
                }
            }
        }
    }

    fn apply_section(&mut self, section: SectionId) {
        let Some(st) = self.timelines.iter().find(|st| st.section == section) else {
            return;
        };
        let mut frame = st.timeline.sample(st.timeline.progress());
        if section == SectionId::Hero {
            self.parallax.layer_onto(&mut frame);
        }
        frame.write_to(self.host.view.as_mut());
    }
}

impl Drop for EffectsRuntime {
    fn drop(&mut self) {
        self.teardown();
    }
}
