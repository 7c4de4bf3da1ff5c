//! Deterministic host for tests and native runs
//!
//! Nothing fires on its own: the driver pulls due frames/timers out and feeds
//! them back to the runtime. Clones share state, so a test can hand boxed
//! clones to the runtime and keep one to inspect what is still registered.

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    CallbackHandle, DelayScheduler, EventKind, EventSource, FrameScheduler, PinHandle,
    ScrollPinner, Subscription, TriggerSpec,
};
use crate::page::SectionId;

#[derive(Debug, Default)]
struct HostState {
    now_ms: f64,
    next_id: u64,
    frames: Vec<CallbackHandle>,
    timers: Vec<(CallbackHandle, f64)>,
    subscriptions: Vec<Subscription>,
    pins: Vec<(PinHandle, TriggerSpec)>,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared manual clock + registries
#[derive(Debug, Clone, Default)]
pub struct ManualHost {
    state: Rc<RefCell<HostState>>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every pending frame request (each frame is one-shot)
    pub fn take_frames(&self) -> Vec<CallbackHandle> {
        std::mem::take(&mut self.state.borrow_mut().frames)
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Move the clock forward and return timers that came due, earliest first
    pub fn advance(&self, ms: f64) -> Vec<CallbackHandle> {
        let mut state = self.state.borrow_mut();
        state.now_ms += ms.max(0.0);
        let now = state.now_ms;

        let mut due: Vec<(CallbackHandle, f64)> = Vec::new();
        state.timers.retain(|&(handle, at)| {
            if at <= now {
                due.push((handle, at));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        due.into_iter().map(|(h, _)| h).collect()
    }

    /// Earliest pending timer and how long until it is due
    pub fn next_timer(&self) -> Option<(CallbackHandle, f64)> {
        let state = self.state.borrow();
        state
            .timers
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|&(h, at)| (h, (at - state.now_ms).max(0.0)))
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.state.borrow().subscriptions.clone()
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .any(|s| s.kind == kind)
    }

    pub fn pins(&self) -> Vec<(PinHandle, TriggerSpec)> {
        self.state.borrow().pins.clone()
    }

    /// Current distance of the trigger registered for `section`
    pub fn pin_distance(&self, section: SectionId) -> Option<f64> {
        self.state
            .borrow()
            .pins
            .iter()
            .find(|(h, _)| h.section == section)
            .and_then(|(_, spec)| spec.distance)
    }

    /// True when nothing is registered or pending
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.frames.is_empty()
            && state.timers.is_empty()
            && state.subscriptions.is_empty()
            && state.pins.is_empty()
    }
}

impl FrameScheduler for ManualHost {
    fn request_frame(&mut self) -> CallbackHandle {
        let mut state = self.state.borrow_mut();
        let handle = CallbackHandle(state.next_id());
        state.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: CallbackHandle) {
        self.state.borrow_mut().frames.retain(|h| *h != handle);
    }
}

impl DelayScheduler for ManualHost {
    fn schedule(&mut self, delay_ms: f64) -> CallbackHandle {
        let mut state = self.state.borrow_mut();
        let handle = CallbackHandle(state.next_id());
        let at = state.now_ms + delay_ms.max(0.0);
        state.timers.push((handle, at));
        handle
    }

    fn cancel(&mut self, handle: CallbackHandle) {
        self.state.borrow_mut().timers.retain(|(h, _)| *h != handle);
    }
}

impl EventSource for ManualHost {
    fn subscribe(&mut self, kind: EventKind) -> Subscription {
        let mut state = self.state.borrow_mut();
        let sub = Subscription {
            id: state.next_id(),
            kind,
        };
        state.subscriptions.push(sub);
        sub
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.state
            .borrow_mut()
            .subscriptions
            .retain(|s| *s != subscription);
    }
}

impl ScrollPinner for ManualHost {
    fn register(&mut self, spec: TriggerSpec) -> PinHandle {
        let mut state = self.state.borrow_mut();
        let handle = PinHandle {
            id: state.next_id(),
            section: spec.section,
        };
        state.pins.push((handle, spec));
        handle
    }

    fn set_distance(&mut self, handle: PinHandle, distance: f64) {
        if let Some((_, spec)) = self
            .state
            .borrow_mut()
            .pins
            .iter_mut()
            .find(|(h, _)| *h == handle)
        {
            spec.distance = Some(distance);
        }
    }

    fn release(&mut self, handle: PinHandle) {
        self.state.borrow_mut().pins.retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_due_order() {
        let host = ManualHost::new();
        let mut timers = host.clone();
        let late = timers.schedule(50.0);
        let early = timers.schedule(10.0);
        let never = timers.schedule(500.0);
        timers.cancel(never);

        assert_eq!(host.next_timer(), Some((early, 10.0)));
        assert_eq!(host.advance(100.0), vec![early, late]);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_frames_are_one_shot() {
        let host = ManualHost::new();
        let mut frames = host.clone();
        let a = frames.request_frame();
        assert_eq!(host.take_frames(), vec![a]);
        assert!(host.take_frames().is_empty());

        let b = frames.request_frame();
        frames.cancel_frame(b);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_registries_clear_on_release() {
        let host = ManualHost::new();
        let mut h = host.clone();
        let sub = h.subscribe(EventKind::Resize);
        let mut spec = TriggerSpec::watch(SectionId::Footer);
        spec.distance = Some(10.0);
        let pin = h.register(spec);
        h.set_distance(pin, 25.0);
        assert_eq!(host.pin_distance(SectionId::Footer), Some(25.0));
        assert!(host.is_subscribed(EventKind::Resize));

        h.unsubscribe(sub);
        h.release(pin);
        assert!(host.is_idle());
    }
}
