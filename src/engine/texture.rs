use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlImageElement, WebGlRenderingContext, WebGlTexture};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadEvent {
    Started,
    Completed,
}

/// Counts image loads the way a loading manager does: the first item to
/// start fires `Started`, the item that brings the count level fires `Completed`.
#[derive(Debug, Default)]
pub struct AssetTracker {
    total: usize,
    loaded: usize,
    failed: usize,
    loading: bool,
}

impl AssetTracker {
    pub fn item_start(&mut self, url: &str) -> Option<LoadEvent> {
        log::debug!("loading {url}");
        self.total += 1;
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(LoadEvent::Started)
    }

    /// Failed items still count as finished so a broken image can't stall the scene.
    pub fn item_end(&mut self, url: &str, ok: bool) -> Option<LoadEvent> {
        self.loaded += 1;
        if !ok {
            self.failed += 1;
            log::error!("failed to load {url}");
        }
        if self.loading && self.loaded >= self.total {
            self.loading = false;
            return Some(LoadEvent::Completed);
        }
        None
    }

    pub fn is_ready(&self) -> bool {
        !self.loading && self.loaded >= self.total
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

pub type SharedTracker = Rc<RefCell<AssetTracker>>;

fn report(event: Option<LoadEvent>) {
    match event {
        Some(LoadEvent::Started) => {
            log::info!("Loading started");
            set_loading_indicator(true);
        }
        Some(LoadEvent::Completed) => {
            log::info!("Loading complete");
            set_loading_indicator(false);
        }
        None => {}
    }
}

/// Matches the page's `<p class="loading">`, or an element with id `loading`.
const LOADING_SELECTOR: &str = ".loading, #loading";

fn indicator_style(loading: bool) -> &'static str {
    if loading { "display: block;" } else { "display: none;" }
}

/// Shows or hides the page's loading indicator, if it has one.
pub fn set_loading_indicator(loading: bool) {
    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
        if let Ok(Some(el)) = document.query_selector(LOADING_SELECTOR) {
            el.set_attribute("style", indicator_style(loading)).ok();
        }
    }
}

/// Creates a texture that is usable immediately (one opaque pixel) and is
/// filled in once the image at `url` arrives.
pub fn load_texture(gl: &WebGlRenderingContext, url: &str, tracker: &SharedTracker) -> Result<WebGlTexture, JsValue> {
    let texture = gl.create_texture().ok_or("Failed to create texture")?;
    gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));

    let pixel = [255u8, 255, 255, 255];
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        WebGlRenderingContext::TEXTURE_2D,
        0,
        WebGlRenderingContext::RGBA as i32,
        1,
        1,
        0,
        WebGlRenderingContext::RGBA,
        WebGlRenderingContext::UNSIGNED_BYTE,
        Some(&pixel),
    )?;

    let img = HtmlImageElement::new()?;
    img.set_cross_origin(Some("anonymous"));

    report(tracker.borrow_mut().item_start(url));

    let onload = {
        let gl = gl.clone();
        let texture = texture.clone();
        let img = img.clone();
        let tracker = tracker.clone();
        let url = url.to_string();
        Closure::wrap(Box::new(move || {
            let ok = upload_image(&gl, &texture, &img).is_ok();
            report(tracker.borrow_mut().item_end(&url, ok));
        }) as Box<dyn FnMut()>)
    };

    let onerror = {
        let tracker = tracker.clone();
        let url = url.to_string();
        Closure::wrap(Box::new(move || {
            report(tracker.borrow_mut().item_end(&url, false));
        }) as Box<dyn FnMut()>)
    };

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();

    img.set_src(url);

    Ok(texture)
}

fn upload_image(gl: &WebGlRenderingContext, texture: &WebGlTexture, img: &HtmlImageElement) -> Result<(), JsValue> {
    gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(texture));
    gl.pixel_storei(WebGlRenderingContext::UNPACK_FLIP_Y_WEBGL, 1);
    gl.tex_image_2d_with_u32_and_u32_and_image(
        WebGlRenderingContext::TEXTURE_2D,
        0,
        WebGlRenderingContext::RGBA as i32,
        WebGlRenderingContext::RGBA,
        WebGlRenderingContext::UNSIGNED_BYTE,
        img,
    )?;
    gl.pixel_storei(WebGlRenderingContext::UNPACK_FLIP_Y_WEBGL, 0);

    // WebGL 1 can only mipmap and repeat power-of-two images.
    if is_power_of_2(img.width()) && is_power_of_2(img.height()) {
        gl.generate_mipmap(WebGlRenderingContext::TEXTURE_2D);
    } else {
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR as i32);
    }
    Ok(())
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}
