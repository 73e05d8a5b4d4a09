//! Browser host binding
//!
//! `StackfallHandle::mount` stacks two canvases inside a container element,
//! drives the engine from `requestAnimationFrame`, and keeps the canvases
//! sized to the container. Dropping (or `destroy`) cancels the pending frame
//! and removes the resize listener.
//!
//! Nothing here throws to JavaScript: a missing container or 2D context
//! leaves the engine detached, which makes every frame a no-op.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlCanvasElement, Window};

use crate::consts::FRAME_MS;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::renderer::CanvasSurface;
use crate::settings::EngineSettings;
use crate::sim::TechToken;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

const LAYER_STYLE: &str =
    "position:absolute; inset:0; width:100%; height:100%; pointer-events:none;";

static LOGGER: Once = Once::new();

fn init_logging() {
    LOGGER.call_once(|| {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
    });
}

fn js_err(value: JsValue) -> EngineError {
    EngineError::Js(format!("{:?}", value))
}

/// State shared with the animation frame and resize closures
struct Host {
    engine: Engine<CanvasSurface>,
    container: Option<Element>,
    last_time: f64,
    frame_id: Option<i32>,
}

impl Host {
    fn fit_to_container(&mut self) {
        if let Some(container) = self.container.as_ref() {
            let (w, h) = (container.client_width(), container.client_height());
            self.engine.resize(w.max(0) as f32, h.max(0) as f32);
        }
    }
}

fn parse_tokens(json: &str) -> Vec<TechToken> {
    match serde_json::from_str(json) {
        Ok(tokens) => tokens,
        Err(e) => {
            log::warn!("Ignoring malformed token list: {}", e);
            Vec::new()
        }
    }
}

fn create_layer(document: &Document, container: &Element, z: u8) -> Result<HtmlCanvasElement> {
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| EngineError::SurfaceUnavailable)?;
    canvas
        .set_attribute("style", &format!("{} z-index:{};", LAYER_STYLE, z))
        .map_err(js_err)?;
    canvas
        .set_attribute("aria-hidden", "true")
        .map_err(js_err)?;
    container.append_child(&canvas).map_err(js_err)?;
    Ok(canvas)
}

fn request_frame(window: &Window, callback: &FrameCallback) -> Option<i32> {
    let callback = callback.borrow();
    let closure = callback.as_ref()?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .ok()
}

/// Handle returned to the host page
#[wasm_bindgen]
pub struct StackfallHandle {
    host: Rc<RefCell<Host>>,
    frame_callback: FrameCallback,
    resize_listener: Option<Closure<dyn FnMut(web_sys::Event)>>,
    canvases: Vec<HtmlCanvasElement>,
    /// Set by the engine's toggle callback, consumed once the engine is released
    toggled: Rc<Cell<Option<bool>>>,
    on_toggle: Option<js_sys::Function>,
    destroyed: bool,
}

#[wasm_bindgen]
impl StackfallHandle {
    /// Mount into the element with id `container_id`.
    /// `tokens_json` is an array of `{ name, displayName?, colorHex? }`.
    pub fn mount(container_id: &str, tokens_json: &str, enabled: bool) -> StackfallHandle {
        init_logging();

        let tokens = parse_tokens(tokens_json);
        let seed = js_sys::Date::now() as u64;
        let mut engine = Engine::new(&tokens, EngineSettings::load(), seed);
        engine.set_enabled(enabled);

        let toggled = Rc::new(Cell::new(None));
        let sink = Rc::clone(&toggled);
        engine.set_on_toggle(move |enabled| sink.set(Some(enabled)));

        let host = Rc::new(RefCell::new(Host {
            engine,
            container: None,
            last_time: 0.0,
            frame_id: None,
        }));

        let mut handle = StackfallHandle {
            host,
            frame_callback: Rc::new(RefCell::new(None)),
            resize_listener: None,
            canvases: Vec::new(),
            toggled,
            on_toggle: None,
            destroyed: false,
        };

        match handle.attach(container_id) {
            Ok(()) => log::info!("Stackfall mounted in #{}", container_id),
            Err(e) => log::warn!("Stackfall running as no-op: {}", e),
        }
        handle
    }

    /// Replace the token list; a changed list restarts the animation
    pub fn set_tokens_json(&self, tokens_json: &str) {
        let tokens = parse_tokens(tokens_json);
        self.host.borrow_mut().engine.set_tokens(&tokens);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.host.borrow_mut().engine.set_enabled(enabled);
    }

    pub fn enabled(&self) -> bool {
        self.host.borrow().engine.enabled()
    }

    /// Flip enabled; fires the `on_toggle` callback with the new value
    pub fn toggle(&self) -> bool {
        let enabled = self.host.borrow_mut().engine.toggle();
        if let Some(enabled) = self.toggled.take() {
            if let Some(callback) = self.on_toggle.as_ref() {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_bool(enabled));
            }
        }
        enabled
    }

    pub fn set_on_toggle(&mut self, callback: js_sys::Function) {
        self.on_toggle = Some(callback);
    }

    /// Monotonic counter; each increment spawns one giant block
    pub fn set_spawn_trigger(&self, counter: f64) {
        if counter.is_finite() {
            self.host
                .borrow_mut()
                .engine
                .set_spawn_trigger(counter.max(0.0) as u64);
        }
    }

    /// Release the frame registration, resize listener and canvases
    pub fn destroy(&mut self) {
        self.teardown();
    }
}

impl StackfallHandle {
    fn attach(&mut self, container_id: &str) -> Result<()> {
        let window = web_sys::window().ok_or(EngineError::SurfaceUnavailable)?;
        let document = window.document().ok_or(EngineError::SurfaceUnavailable)?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or(EngineError::SurfaceUnavailable)?;

        let lower = create_layer(&document, &container, 0)?;
        self.canvases.push(lower.clone());
        let upper = create_layer(&document, &container, 1)?;
        self.canvases.push(upper.clone());

        {
            let mut host = self.host.borrow_mut();
            host.engine
                .attach_surfaces(CanvasSurface::new(lower)?, CanvasSurface::new(upper)?);
            host.container = Some(container);
            host.fit_to_container();
        }

        self.listen_resize(&window)?;
        self.start_loop(&window);
        Ok(())
    }

    fn listen_resize(&mut self, window: &Window) -> Result<()> {
        let host = Rc::clone(&self.host);
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            host.borrow_mut().fit_to_container();
        });
        window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
            .map_err(js_err)?;
        self.resize_listener = Some(closure);
        Ok(())
    }

    fn start_loop(&mut self, window: &Window) {
        let host = Rc::clone(&self.host);
        let next = Rc::clone(&self.frame_callback);
        *self.frame_callback.borrow_mut() = Some(Closure::new(move |time: f64| {
            {
                let mut h = host.borrow_mut();
                let dt = if h.last_time > 0.0 {
                    time - h.last_time
                } else {
                    FRAME_MS
                };
                h.last_time = time;
                h.engine.frame(dt);
            }
            let id = web_sys::window().and_then(|w| request_frame(&w, &next));
            host.borrow_mut().frame_id = id;
        }));
        let id = request_frame(window, &self.frame_callback);
        self.host.borrow_mut().frame_id = id;
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(window) = web_sys::window() {
            if let Some(id) = self.host.borrow_mut().frame_id.take() {
                let _ = window.cancel_animation_frame(id);
            }
            if let Some(listener) = self.resize_listener.take() {
                let _ = window.remove_event_listener_with_callback(
                    "resize",
                    listener.as_ref().unchecked_ref(),
                );
            }
        }
        // The frame closure holds an Rc to its own cell; dropping it breaks the cycle
        self.frame_callback.borrow_mut().take();

        let mut host = self.host.borrow_mut();
        host.engine.detach_surfaces();
        host.container = None;
        for canvas in self.canvases.drain(..) {
            canvas.remove();
        }
        log::info!("Stackfall destroyed");
    }
}

impl Drop for StackfallHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
