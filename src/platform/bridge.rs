//! Host callback routing
//!
//! Browser callbacks can fire while the runtime is already borrowed
//! (ScrollTrigger reports synchronously on create and refresh, and a page
//! script may call `destroy` from inside one). Deliveries are queued and fed
//! in order by whoever next finds the runtime free. Once the runtime is torn
//! down or dropped, everything still queued is discarded.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use super::{CallbackHandle, InputEvent};
use crate::lifecycle::EffectsRuntime;

/// Something the host handed us for the runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delivery {
    Frame(CallbackHandle, f64),
    Timer(CallbackHandle),
    Input(InputEvent),
    /// Release everything and stop routing
    Teardown,
}

/// Routes host callbacks into the runtime
#[derive(Default)]
pub struct Bridge {
    runtime: RefCell<Weak<RefCell<EffectsRuntime>>>,
    backlog: RefCell<VecDeque<Delivery>>,
}

impl Bridge {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn attach(&self, runtime: &Rc<RefCell<EffectsRuntime>>) {
        *self.runtime.borrow_mut() = Rc::downgrade(runtime);
    }

    pub fn is_attached(&self) -> bool {
        self.runtime.borrow().strong_count() > 0
    }

    pub fn queued(&self) -> usize {
        self.backlog.borrow().len()
    }

    pub fn deliver(&self, delivery: Delivery) {
        self.backlog.borrow_mut().push_back(delivery);
        self.drain();
    }

    /// Feed queued deliveries to the runtime if it is free
    pub fn drain(&self) {
        let Some(runtime) = self.runtime.borrow().upgrade() else {
            self.backlog.borrow_mut().clear();
            return;
        };
        // Busy: whoever holds the borrow drains when done
        let Ok(mut runtime) = runtime.try_borrow_mut() else {
            return;
        };

        loop {
            let next = self.backlog.borrow_mut().pop_front();
            let Some(delivery) = next else {
                break;
            };
            match delivery {
                Delivery::Frame(handle, time) => {
                    runtime.on_frame(handle, time);
                }
                Delivery::Timer(handle) => {
                    runtime.on_timer(handle);
                }
                Delivery::Input(event) => {
                    runtime.dispatch(event);
                }
                Delivery::Teardown => {
                    runtime.teardown();
                    *self.runtime.borrow_mut() = Weak::new();
                    self.backlog.borrow_mut().clear();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::Viewport;
    use crate::lifecycle::{Collaborators, RuntimePhase};
    use crate::platform::ManualHost;
    use crate::renderer::RecordingView;
    use crate::settings::EffectsConfig;

    fn mounted() -> (Rc<RefCell<EffectsRuntime>>, Rc<Bridge>, ManualHost) {
        let host = ManualHost::new();
        let mut config = EffectsConfig::default();
        config.particles.pool_size = Some(4);
        let collaborators = Collaborators::manual(&host, None, Box::new(RecordingView::new()));
        let runtime = Rc::new(RefCell::new(EffectsRuntime::new(
            config,
            Viewport::new(800.0, 600.0),
            collaborators,
            3,
        )));
        let bridge = Bridge::new();
        bridge.attach(&runtime);
        runtime.borrow_mut().activate();
        (runtime, bridge, host)
    }

    #[test]
    fn test_frames_reach_a_free_runtime() {
        let (runtime, bridge, host) = mounted();
        let frame = host.take_frames()[0];
        bridge.deliver(Delivery::Frame(frame, 16.0));
        assert_eq!(runtime.borrow().frames_rendered(), 1);
        assert_eq!(bridge.queued(), 0);
    }

    #[test]
    fn test_teardown_while_busy_runs_once_free() {
        let (runtime, bridge, host) = mounted();

        {
            let _busy = runtime.borrow_mut();
            bridge.deliver(Delivery::Teardown);
            assert_eq!(bridge.queued(), 1);
        }
        assert_eq!(runtime.borrow().phase(), RuntimePhase::Active);

        bridge.drain();
        assert_eq!(runtime.borrow().phase(), RuntimePhase::TornDown);
        assert!(host.is_idle());
        assert!(!bridge.is_attached());
    }

    #[test]
    fn test_deliveries_after_teardown_are_dropped() {
        let (runtime, bridge, host) = mounted();
        let frame = host.take_frames()[0];

        {
            let _busy = runtime.borrow_mut();
            bridge.deliver(Delivery::Teardown);
            bridge.deliver(Delivery::Frame(frame, 16.0));
        }
        bridge.drain();

        assert_eq!(runtime.borrow().frames_rendered(), 0);
        bridge.deliver(Delivery::Frame(frame, 32.0));
        assert_eq!(bridge.queued(), 0);
        assert_eq!(runtime.borrow().frames_rendered(), 0);
    }

    #[test]
    fn test_dropped_runtime_clears_backlog() {
        let (runtime, bridge, _host) = mounted();
        drop(runtime);
        bridge.deliver(Delivery::Input(InputEvent::LayoutChanged));
        assert_eq!(bridge.queued(), 0);
    }
}
