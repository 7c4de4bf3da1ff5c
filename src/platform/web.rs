//! Browser collaborators
//!
//! Frames map to `requestAnimationFrame`, delays to `setTimeout`, listeners
//! to DOM events (plus ScrollTrigger's `refresh` for layout changes) and pins
//! to GSAP ScrollTrigger. Every browser callback goes through the `Bridge`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, EventTarget, MouseEvent, Window};

use super::{
    Bridge, CallbackHandle, DelayScheduler, Delivery, EventKind, EventSource, FrameScheduler,
    InputEvent, PinHandle, ScrollPinner, Subscription, TriggerSpec,
};
use crate::fx::Viewport;
use crate::lifecycle::{Collaborators, EffectsRuntime, RuntimePhase};
use crate::page::SectionId;
use crate::page;
use crate::renderer::RasterSurface;
use crate::renderer::web::{Canvas2dSurface, DomView};
use crate::settings::EffectsConfig;

#[wasm_bindgen(inline_js = "
    export function fx_create_trigger(trigger, start, distance, pin, once, on_update, on_enter, on_leave_back) {
        if (typeof ScrollTrigger === 'undefined') {
            return null;
        }
        const state = { distance };
        const st = ScrollTrigger.create({
            trigger,
            start,
            end: distance === undefined ? undefined : () => '+=' + state.distance,
            pin,
            once,
            invalidateOnRefresh: true,
            onUpdate: (self) => on_update(self.progress),
            onEnter: () => on_enter(),
            onLeaveBack: () => on_leave_back(),
        });
        st._fxState = state;
        return st;
    }

    export function fx_set_trigger_distance(st, distance) {
        if (st && st._fxState) {
            st._fxState.distance = distance;
            st.refresh();
        }
    }

    export function fx_kill_trigger(st) {
        if (st) {
            st.kill(true);
        }
    }

    export function fx_on_refresh(callback) {
        if (typeof ScrollTrigger === 'undefined') {
            return false;
        }
        ScrollTrigger.addEventListener('refresh', callback);
        return true;
    }

    export function fx_off_refresh(callback) {
        if (typeof ScrollTrigger !== 'undefined') {
            ScrollTrigger.removeEventListener('refresh', callback);
        }
    }
")]
extern "C" {
    #[allow(clippy::too_many_arguments)]
    fn fx_create_trigger(
        trigger: &JsValue,
        start: &str,
        distance: Option<f64>,
        pin: bool,
        once: bool,
        on_update: &JsValue,
        on_enter: &JsValue,
        on_leave_back: &JsValue,
    ) -> JsValue;
    fn fx_set_trigger_distance(trigger: &JsValue, distance: f64);
    fn fx_kill_trigger(trigger: &JsValue);
    fn fx_on_refresh(callback: &JsValue) -> bool;
    fn fx_off_refresh(callback: &JsValue);
}

fn window() -> Option<Window> {
    web_sys::window()
}

fn document() -> Option<Document> {
    window().and_then(|w| w.document())
}

/// Current window size in CSS px
pub fn window_viewport() -> Viewport {
    let Some(window) = window() else {
        return Viewport::default();
    };
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(width, height)
}

// === Frames ===

/// `requestAnimationFrame` scheduler
pub struct WebFrames {
    bridge: Rc<Bridge>,
    next_id: u64,
    pending: Rc<RefCell<HashMap<u64, i32>>>,
}

impl WebFrames {
    pub fn new(bridge: Rc<Bridge>) -> Self {
        Self {
            bridge,
            next_id: 0,
            pending: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl FrameScheduler for WebFrames {
    fn request_frame(&mut self) -> CallbackHandle {
        self.next_id += 1;
        let handle = CallbackHandle(self.next_id);

        let bridge = self.bridge.clone();
        let pending = self.pending.clone();
        let callback = Closure::once_into_js(move |time: f64| {
            pending.borrow_mut().remove(&handle.0);
            bridge.deliver(Delivery::Frame(handle, time));
        });

        match window().map(|w| w.request_animation_frame(callback.unchecked_ref())) {
            Some(Ok(raf_id)) => {
                self.pending.borrow_mut().insert(handle.0, raf_id);
            }
            _ => log::warn!("requestAnimationFrame unavailable"),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: CallbackHandle) {
        if let Some(raf_id) = self.pending.borrow_mut().remove(&handle.0) {
            if let Some(window) = window() {
                let _ = window.cancel_animation_frame(raf_id);
            }
        }
    }
}

// === Timers ===

/// `setTimeout` scheduler
pub struct WebTimers {
    bridge: Rc<Bridge>,
    next_id: u64,
    pending: Rc<RefCell<HashMap<u64, i32>>>,
}

impl WebTimers {
    pub fn new(bridge: Rc<Bridge>) -> Self {
        Self {
            bridge,
            next_id: 0,
            pending: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl DelayScheduler for WebTimers {
    fn schedule(&mut self, delay_ms: f64) -> CallbackHandle {
        self.next_id += 1;
        let handle = CallbackHandle(self.next_id);

        let bridge = self.bridge.clone();
        let pending = self.pending.clone();
        let callback = Closure::once_into_js(move || {
            pending.borrow_mut().remove(&handle.0);
            bridge.deliver(Delivery::Timer(handle));
        });

        let delay = delay_ms.max(0.0).round() as i32;
        match window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        }) {
            Some(Ok(timeout_id)) => {
                self.pending.borrow_mut().insert(handle.0, timeout_id);
            }
            _ => log::warn!("setTimeout unavailable"),
        }
        handle
    }

    fn cancel(&mut self, handle: CallbackHandle) {
        if let Some(timeout_id) = self.pending.borrow_mut().remove(&handle.0) {
            if let Some(window) = window() {
                window.clear_timeout_with_handle(timeout_id);
            }
        }
    }
}

// === Events ===

enum Listener {
    Dom {
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    },
    /// ScrollTrigger's global `refresh` event
    ScrollRefresh(Closure<dyn FnMut()>),
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        Listener::Dom {
            target,
            event,
            closure,
        }
    }

    fn on_scroll_refresh(handler: impl FnMut() + 'static) -> Option<Self> {
        let closure = Closure::<dyn FnMut()>::new(handler);
        fx_on_refresh(closure.as_ref()).then_some(Listener::ScrollRefresh(closure))
    }

    fn detach(self) {
        match self {
            Listener::Dom {
                target,
                event,
                closure,
            } => {
                let _ = target
                    .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            }
            Listener::ScrollRefresh(closure) => fx_off_refresh(closure.as_ref()),
        }
    }
}

fn client_pos(event: &web_sys::Event) -> Option<DVec2> {
    event
        .dyn_ref::<MouseEvent>()
        .map(|e| DVec2::new(e.client_x() as f64, e.client_y() as f64))
}

/// DOM listeners
pub struct WebEvents {
    bridge: Rc<Bridge>,
    next_id: u64,
    listeners: HashMap<u64, Vec<Listener>>,
}

impl WebEvents {
    pub fn new(bridge: Rc<Bridge>) -> Self {
        Self {
            bridge,
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    fn listeners_for(&self, kind: EventKind) -> Vec<Listener> {
        let Some(document) = document() else {
            return Vec::new();
        };
        let bridge = self.bridge.clone();

        match kind {
            EventKind::PointerMove => {
                vec![Listener::attach(document.into(), "mousemove", move |e| {
                    if let Some(pos) = client_pos(&e) {
                        bridge.deliver(Delivery::Input(InputEvent::PointerMove(pos)));
                    }
                })]
            }
            EventKind::GridPointer => {
                let section = document.query_selector(SectionId::Neural.selector()).ok().flatten();
                let grid = document.get_element_by_id(page::NEURAL_GRID);
                let (Some(section), Some(grid)) = (section, grid) else {
                    log::warn!("Neural grid section missing, grid pointer not tracked");
                    return Vec::new();
                };

                let move_bridge = bridge.clone();
                let on_move = move |e: web_sys::Event| {
                    let Some(pos) = client_pos(&e) else {
                        return;
                    };
                    let rect = grid.get_bounding_client_rect();
                    let local = pos - DVec2::new(rect.left(), rect.top());
                    move_bridge.deliver(Delivery::Input(InputEvent::GridPointer(local)));
                };
                let on_leave = move |_e: web_sys::Event| {
                    bridge.deliver(Delivery::Input(InputEvent::GridPointerLeave));
                };
                vec![
                    Listener::attach(section.clone().into(), "mousemove", on_move),
                    Listener::attach(section.into(), "mouseleave", on_leave),
                ]
            }
            EventKind::CardsPointer => {
                let Some(container) = document.get_element_by_id(page::CARDS_CONTAINER) else {
                    log::warn!("#{} missing, spotlight disabled", page::CARDS_CONTAINER);
                    return Vec::new();
                };
                vec![Listener::attach(container.into(), "mousemove", move |e| {
                    if let Some(pos) = client_pos(&e) {
                        bridge.deliver(Delivery::Input(InputEvent::CardsPointer(pos)));
                    }
                })]
            }
            EventKind::Resize => {
                let Some(window) = window() else {
                    return Vec::new();
                };
                vec![Listener::attach(window.into(), "resize", move |_e| {
                    bridge.deliver(Delivery::Input(InputEvent::Resize(window_viewport())));
                })]
            }
            EventKind::Layout => {
                let listener = Listener::on_scroll_refresh(move || {
                    bridge.deliver(Delivery::Input(InputEvent::LayoutChanged));
                });
                if listener.is_none() {
                    log::warn!("ScrollTrigger not loaded, layout refreshes not tracked");
                }
                listener.into_iter().collect()
            }
        }
    }
}

impl EventSource for WebEvents {
    fn subscribe(&mut self, kind: EventKind) -> Subscription {
        self.next_id += 1;
        let listeners = self.listeners_for(kind);
        self.listeners.insert(self.next_id, listeners);
        Subscription {
            id: self.next_id,
            kind,
        }
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        if let Some(listeners) = self.listeners.remove(&subscription.id) {
            listeners.into_iter().for_each(Listener::detach);
        }
    }
}

// === Scroll triggers ===

struct Trigger {
    instance: JsValue,
    _on_update: Closure<dyn FnMut(f64)>,
    _on_enter: Closure<dyn FnMut()>,
    _on_leave_back: Closure<dyn FnMut()>,
}

/// GSAP ScrollTrigger pinner
pub struct WebPinner {
    bridge: Rc<Bridge>,
    next_id: u64,
    triggers: HashMap<u64, Trigger>,
}

impl WebPinner {
    pub fn new(bridge: Rc<Bridge>) -> Self {
        Self {
            bridge,
            next_id: 0,
            triggers: HashMap::new(),
        }
    }

    /// Trigger argument: the selector, or the exact element for indexed sections
    fn trigger_target(section: SectionId) -> Option<JsValue> {
        let Some(index) = section.nth() else {
            return Some(JsValue::from_str(section.selector()));
        };
        let nodes = document()?.query_selector_all(section.selector()).ok()?;
        nodes.item(index as u32).map(JsValue::from)
    }
}

impl ScrollPinner for WebPinner {
    fn register(&mut self, spec: TriggerSpec) -> PinHandle {
        self.next_id += 1;
        let handle = PinHandle {
            id: self.next_id,
            section: spec.section,
        };
        let section = spec.section;

        let bridge = self.bridge.clone();
        let on_update = Closure::<dyn FnMut(f64)>::new(move |progress: f64| {
            bridge.deliver(Delivery::Input(InputEvent::ScrollProgress { section, progress }));
        });
        let bridge = self.bridge.clone();
        let on_enter = Closure::<dyn FnMut()>::new(move || {
            bridge.deliver(Delivery::Input(InputEvent::SectionEntered(section)));
        });
        let bridge = self.bridge.clone();
        let on_leave_back = Closure::<dyn FnMut()>::new(move || {
            bridge.deliver(Delivery::Input(InputEvent::SectionLeftBack(section)));
        });

        let instance = match Self::trigger_target(section) {
            Some(target) => fx_create_trigger(
                &target,
                spec.start,
                spec.distance,
                spec.pin,
                spec.once,
                on_update.as_ref(),
                on_enter.as_ref(),
                on_leave_back.as_ref(),
            ),
            None => JsValue::NULL,
        };
        if instance.is_null() {
            log::warn!("ScrollTrigger not loaded, {:?} will not track scroll", section);
        }

        self.triggers.insert(
            handle.id,
            Trigger {
                instance,
                _on_update: on_update,
                _on_enter: on_enter,
                _on_leave_back: on_leave_back,
            },
        );
        handle
    }

    fn set_distance(&mut self, handle: PinHandle, distance: f64) {
        if let Some(trigger) = self.triggers.get(&handle.id) {
            fx_set_trigger_distance(&trigger.instance, distance);
        }
    }

    fn release(&mut self, handle: PinHandle) {
        if let Some(trigger) = self.triggers.remove(&handle.id) {
            fx_kill_trigger(&trigger.instance);
        }
    }
}

// === Mount ===

/// Running effects on the current page
#[wasm_bindgen]
pub struct PageEffects {
    runtime: Rc<RefCell<EffectsRuntime>>,
    bridge: Rc<Bridge>,
}

#[wasm_bindgen]
impl PageEffects {
    /// Build every effect against the current document and start them
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PageEffects, JsValue> {
        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
        let config = EffectsConfig::load();
        let seed = js_sys::Date::now() as u64;

        let surface = Canvas2dSurface::from_id(&document, page::PARTICLE_CANVAS)
            .map(|s| Box::new(s) as Box<dyn RasterSurface>);
        if surface.is_none() {
            log::warn!("#{} has no 2D context", page::PARTICLE_CANVAS);
        }

        let bridge = Bridge::new();
        let collaborators = Collaborators {
            frames: Box::new(WebFrames::new(bridge.clone())),
            timers: Box::new(WebTimers::new(bridge.clone())),
            events: Box::new(WebEvents::new(bridge.clone())),
            pins: Box::new(WebPinner::new(bridge.clone())),
            surface,
            view: Box::new(DomView::new(document)),
        };

        let runtime = Rc::new(RefCell::new(EffectsRuntime::new(
            config,
            window_viewport(),
            collaborators,
            seed,
        )));
        bridge.attach(&runtime);

        runtime.borrow_mut().activate();
        bridge.drain();

        log::info!("Page effects mounted (seed {})", seed);
        Ok(Self { runtime, bridge })
    }

    /// False once torn down (still true while a callback holds the runtime)
    pub fn is_active(&self) -> bool {
        self.runtime
            .try_borrow()
            .map(|runtime| runtime.phase() == RuntimePhase::Active)
            .unwrap_or(true)
    }

    /// Tracked content changed size (fonts, images); re-measure pins
    pub fn refresh_layout(&self) {
        self.bridge.deliver(Delivery::Input(InputEvent::LayoutChanged));
    }

    /// Stop everything and release every browser registration; from inside a
    /// runtime callback this lands as soon as that callback returns
    pub fn destroy(&self) {
        self.bridge.deliver(Delivery::Teardown);
        if self.bridge.is_attached() {
            log::debug!("destroy() queued behind a running callback");
        }
    }
}
