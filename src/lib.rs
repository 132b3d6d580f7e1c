mod config;
mod engine;
mod error;
mod scene;
mod viewer;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, Request, RequestInit, RequestMode, Response, WebGlRenderingContext, WheelEvent, Window};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use crate::config::SceneConfig;
use crate::engine::renderer::Renderer;
use crate::error::SceneError;
use crate::scene::viewport::Viewport;
use crate::viewer::Viewer;

const CONFIG_URL: &str = "assets/scene.json";

thread_local! {
    static VIEWER: RefCell<Option<Viewer>> = RefCell::new(None);
    static BINDINGS: RefCell<Option<Bindings>> = RefCell::new(None);
}

/// Everything that keeps the scene alive from the browser's side.
struct Bindings {
    listeners: Vec<Listener>,
    frame_loop: FrameLoop,
}

/// A DOM listener that unregisters itself when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add<E: JsCast + 'static>(target: &EventTarget, kind: &'static str, mut handler: impl FnMut(E) + 'static) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        }) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        Ok(Listener { target: target.clone(), kind, callback })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref())
            .ok();
    }
}

/// Self-rescheduling `requestAnimationFrame` loop with an explicit stop.
struct FrameLoop {
    callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    /// Runs `tick` once per display frame until it returns false or `stop` is called.
    fn start(window: &Window, mut tick: impl FnMut() -> bool + 'static) -> Result<Self, JsValue> {
        let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        let handle = Rc::new(Cell::new(None));
        let pending = handle.clone();
        let win = window.clone();

        *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            pending.set(None);
            if !tick() {
                return;
            }
            if let Some(callback) = f.borrow().as_ref() {
                match request_animation_frame(&win, callback) {
                    Ok(id) => pending.set(Some(id)),
                    Err(e) => log::error!("failed to schedule frame: {:?}", e),
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(callback) = g.borrow().as_ref() {
            handle.set(Some(request_animation_frame(window, callback)?));
        }

        Ok(FrameLoop { callback: g, handle })
    }

    fn stop(&self, window: &Window) {
        if let Some(id) = self.handle.take() {
            window.cancel_animation_frame(id).ok();
        }
        // Breaks the closure's reference to itself.
        self.callback.borrow_mut().take();
    }
}

fn request_animation_frame(window: &Window, f: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    window.request_animation_frame(f.as_ref().unchecked_ref())
}

fn with_viewer(f: impl FnOnce(&mut Viewer) -> Result<(), JsValue>) {
    VIEWER.with(|v| {
        if let Some(viewer) = v.borrow_mut().as_mut() {
            if let Err(e) = f(viewer) {
                log::error!("{:?}", e);
            }
        }
    });
}

fn window_size(window: &Window) -> (f32, f32) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    (width as f32, height as f32)
}

fn find_canvas(document: &Document) -> Result<HtmlCanvasElement, SceneError> {
    let element = document
        .query_selector("canvas.canvas")
        .ok()
        .flatten()
        .or_else(|| document.get_element_by_id("canvas"))
        .ok_or(SceneError::MissingElement("canvas"))?;
    element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| SceneError::MissingElement("canvas"))
}

async fn fetch_config(window: &Window) -> Result<SceneConfig, SceneError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(CONFIG_URL, &opts)?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
    if !resp.ok() {
        return Err(SceneError::Js(format!("{} returned {}", CONFIG_URL, resp.status())));
    }
    let text = JsFuture::from(resp.text()?).await?;
    let text = text.as_string().unwrap_or_default();
    SceneConfig::from_json(&text)
}

/// Starts the scene with `assets/scene.json`, or the built-in defaults when
/// that file is missing or malformed.
#[wasm_bindgen]
pub async fn start_scene() -> Result<(), JsValue> {
    init_logging();
    let window = web_sys::window().ok_or(SceneError::MissingElement("window"))?;
    let config = match fetch_config(&window).await {
        Ok(config) => config,
        Err(e) => {
            log::warn!("using default scene config: {}", e);
            SceneConfig::default()
        }
    };
    launch(&window, config)
}

/// Starts the scene with a config object supplied by the page.
#[wasm_bindgen]
pub fn start_scene_with_config(config: JsValue) -> Result<(), JsValue> {
    init_logging();
    let window = web_sys::window().ok_or(SceneError::MissingElement("window"))?;
    let config: SceneConfig = serde_wasm_bindgen::from_value(config)?;
    launch(&window, config)
}

/// Stops the frame loop, removes every listener and the label overlay.
#[wasm_bindgen]
pub fn stop_scene() {
    let bindings = BINDINGS.with(|b| b.borrow_mut().take());
    if let (Some(bindings), Some(window)) = (bindings, web_sys::window()) {
        bindings.frame_loop.stop(&window);
        log::debug!("removing {} listeners", bindings.listeners.len());
    }
    if let Some(viewer) = VIEWER.with(|v| v.borrow_mut().take()) {
        viewer.dispose();
    }
}

fn init_logging() {
    console_error_panic_hook::set_once();
    // A second start after stop_scene finds the logger already installed.
    console_log::init_with_level(log::Level::Info).ok();
}

fn launch(window: &Window, config: SceneConfig) -> Result<(), JsValue> {
    if VIEWER.with(|v| v.borrow().is_some()) {
        log::warn!("scene already running");
        return Ok(());
    }

    let document = window.document().ok_or(SceneError::MissingElement("document"))?;
    let canvas = find_canvas(&document)?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or(SceneError::WebGl("WebGL is not available".to_string()))?
        .dyn_into::<WebGlRenderingContext>()?;

    let renderer = Renderer::new(gl)?;

    let (width, height) = window_size(window);
    let viewport = Viewport::new(width, height, window.device_pixel_ratio() as f32);

    let viewer = Viewer::new(renderer, canvas.clone(), document, config, viewport)?;
    let (viewer, bindings) = attach_or_discard(
        viewer,
        || {
            let listeners = register_listeners(window, &canvas)?;
            let frame_loop = FrameLoop::start(window, tick_viewer)?;
            Ok::<_, JsValue>(Bindings { listeners, frame_loop })
        },
        Viewer::dispose,
    )?;

    // The first frame runs after this returns, so the slots are filled in time.
    VIEWER.with(|v| *v.borrow_mut() = Some(viewer));
    BINDINGS.with(|b| *b.borrow_mut() = Some(bindings));
    log::info!("scene started at {}x{}", width, height);
    Ok(())
}

/// Runs `attach` for a freshly built viewer and keeps both only when it
/// succeeds. On failure the viewer goes to `discard`, so a failed start
/// leaves nothing behind that would block the next one.
fn attach_or_discard<V, B, E>(
    viewer: V,
    attach: impl FnOnce() -> Result<B, E>,
    discard: impl FnOnce(V),
) -> Result<(V, B), E> {
    match attach() {
        Ok(bindings) => Ok((viewer, bindings)),
        Err(e) => {
            discard(viewer);
            Err(e)
        }
    }
}

fn tick_viewer() -> bool {
    VIEWER.with(|v| match v.borrow_mut().as_mut() {
        Some(viewer) => match viewer.tick() {
            Ok(()) => true,
            Err(e) => {
                log::error!("frame failed, stopping the loop: {:?}", e);
                false
            }
        },
        None => false,
    })
}

fn register_listeners(window: &Window, canvas: &HtmlCanvasElement) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::new();
    let window_target: &EventTarget = window.as_ref();
    let canvas_target: &EventTarget = canvas.as_ref();

    let win = window.clone();
    listeners.push(Listener::add(window_target, "resize", move |_: Event| {
        let (width, height) = window_size(&win);
        let dpr = win.device_pixel_ratio() as f32;
        with_viewer(|viewer| viewer.on_resize(width, height, dpr));
    })?);

    listeners.push(Listener::add(window_target, "mousemove", |event: MouseEvent| {
        with_viewer(|viewer| {
            viewer.on_pointer_move(event.client_x() as f32, event.client_y() as f32);
            Ok(())
        });
    })?);

    listeners.push(Listener::add(window_target, "mouseup", |_: MouseEvent| {
        with_viewer(|viewer| {
            viewer.on_pointer_up();
            Ok(())
        });
    })?);

    listeners.push(Listener::add(canvas_target, "mousedown", |event: MouseEvent| {
        with_viewer(|viewer| {
            viewer.on_pointer_down(event.button(), event.client_x() as f32, event.client_y() as f32);
            Ok(())
        });
    })?);

    listeners.push(Listener::add(canvas_target, "wheel", |event: WheelEvent| {
        event.prevent_default();
        with_viewer(|viewer| {
            viewer.on_wheel(event.delta_y() as f32);
            Ok(())
        });
    })?);

    // Right-drag pans, so the context menu has to stay out of the way.
    listeners.push(Listener::add(canvas_target, "contextmenu", |event: Event| {
        event.prevent_default();
    })?);

    Ok(listeners)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_attach_discards_the_viewer() {
        let mut discarded = None;
        let result: Result<(&str, ()), &str> =
            attach_or_discard("viewer", || Err("no listeners"), |viewer| discarded = Some(viewer));
        assert_eq!(result, Err("no listeners"));
        assert_eq!(discarded, Some("viewer"));
    }

    #[test]
    fn successful_attach_keeps_both() {
        let mut discarded = None;
        let result: Result<(&str, u32), &str> =
            attach_or_discard("viewer", || Ok(6), |viewer| discarded = Some(viewer));
        assert_eq!(result, Ok(("viewer", 6)));
        assert_eq!(discarded, None);
    }
}
