//! Obelisk FX entry point
//!
//! Handles platform-specific initialization: the browser build mounts the
//! effects on the page, the native build runs a headless session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;

    use obelisk_fx::platform::web::PageEffects;

    thread_local! {
        static MOUNTED: RefCell<Option<PageEffects>> = const { RefCell::new(None) };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Obelisk FX starting...");

        match PageEffects::new() {
            Ok(effects) => MOUNTED.with(|m| *m.borrow_mut() = Some(effects)),
            Err(e) => log::error!("Failed to mount effects: {:?}", e),
        }
    }

    /// Re-measure pinned content after the host changed the layout
    pub fn refresh() {
        MOUNTED.with(|m| {
            if let Some(effects) = m.borrow().as_ref() {
                effects.refresh_layout();
            }
        });
    }

    /// Tear down the mounted effects (host page navigation)
    pub fn unmount() {
        if let Some(effects) = MOUNTED.with(|m| m.borrow_mut().take()) {
            effects.destroy();
            log::info!("Obelisk FX unmounted");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn refresh_effects() {
    wasm_page::refresh();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn destroy_effects() {
    wasm_page::unmount();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Obelisk FX (native) starting...");
    log::info!("Native mode runs headless - use `trunk serve` for the page");

    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drive one scripted session against recording collaborators
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec2;
    use obelisk_fx::fx::{PropertyName, Viewport};
    use obelisk_fx::page::{self, SectionId};
    use obelisk_fx::platform::{InputEvent, ManualHost};
    use obelisk_fx::renderer::{RecordingSurface, RecordingView};
    use obelisk_fx::{Collaborators, EffectsConfig, EffectsRuntime};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const FRAMES: usize = 120;

    pub fn run() {
        let host = ManualHost::new();
        let view = Rc::new(RefCell::new(
            RecordingView::with_elements(&[
                page::MONOLITH,
                page::HERO_TITLE_1,
                page::HERO_TITLE_2,
                page::HERO_TITLE_3,
                page::HERO_SUBTITLE,
                page::PIPELINE_STRIP,
                page::PIPELINE_IMAGES,
                page::CODE_CARD,
            ])
            .with_repeated(page::FEATURE_BLOCK, 4)
            .with_chart_area()
            .with_content_width(page::PIPELINE_STRIP, 4800.0),
        ));
        let surface = Rc::new(RefCell::new(RecordingSurface::new()));

        let config = EffectsConfig::load();
        let seed = config.seed.unwrap_or(0x0B31_15C0);
        let collaborators =
            Collaborators::manual(&host, Some(Box::new(surface.clone())), Box::new(view.clone()));
        let mut runtime =
            EffectsRuntime::new(config, Viewport::new(1280.0, 720.0), collaborators, seed);
        runtime.activate();

        runtime.dispatch(InputEvent::PointerMove(DVec2::new(900.0, 200.0)));
        runtime.dispatch(InputEvent::GridPointer(DVec2::new(400.0, 300.0)));
        runtime.dispatch(InputEvent::SectionEntered(SectionId::Terminal));
        runtime.dispatch(InputEvent::SectionEntered(SectionId::Dev));
        runtime.dispatch(InputEvent::SectionEntered(SectionId::FeatureBlock(0)));

        for i in 0..FRAMES {
            let now = i as f64 * FRAME_MS;
            for handle in host.take_frames() {
                runtime.on_frame(handle, now);
            }
            for handle in host.advance(FRAME_MS) {
                runtime.on_timer(handle);
            }
            runtime.dispatch(InputEvent::ScrollProgress {
                section: SectionId::Hero,
                progress: i as f64 / FRAMES as f64,
            });
        }

        log::info!(
            "Rendered {} frames, {} grid markers active",
            runtime.frames_rendered(),
            runtime.grid().active_count()
        );
        log::info!(
            "Code card opacity {:.2}, hero scroll shown at {:.2}",
            view.borrow()
                .property(page::CODE_CARD, PropertyName::Opacity)
                .unwrap_or_default(),
            runtime
                .timeline(SectionId::Hero)
                .map(|t| t.progress())
                .unwrap_or_default()
        );
        for line in view.borrow().terminal.iter() {
            log::info!("terminal | {}", line);
        }
        log::info!("Last frame painted {} rects", surface.borrow().last_frame().len().saturating_sub(1));

        runtime.teardown();
        log::info!("Torn down cleanly: {}", host.is_idle());
    }
}
