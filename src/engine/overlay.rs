use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::scene::label::LabelPlacement;

/// Full-window HTML layer that positions labels over the canvas.
pub struct LabelOverlay {
    root: HtmlElement,
    label: Option<HtmlElement>,
}

impl LabelOverlay {
    pub fn new(document: &Document, width: f32, height: f32) -> Result<Self, JsValue> {
        let root = document.create_element("div")?.dyn_into::<HtmlElement>()?;
        let style = root.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", "0px")?;
        style.set_property("left", "0px")?;
        style.set_property("overflow", "hidden")?;
        style.set_property("pointer-events", "none")?;

        let body = document.body().ok_or("No body")?;
        body.append_child(&root)?;

        let overlay = LabelOverlay { root, label: None };
        overlay.set_size(width, height)?;
        Ok(overlay)
    }

    pub fn set_size(&self, width: f32, height: f32) -> Result<(), JsValue> {
        let style = self.root.style();
        style.set_property("width", &format!("{width}px"))?;
        style.set_property("height", &format!("{height}px"))?;
        Ok(())
    }

    /// Adds `<div class="{class}"><p>{text}</p></div>` to the overlay.
    pub fn attach(&mut self, document: &Document, text: &str, class: &str) -> Result<(), JsValue> {
        let tag = document.create_element("div")?.dyn_into::<HtmlElement>()?;
        tag.set_class_name(class);
        let paragraph = document.create_element("p")?;
        paragraph.set_text_content(Some(text));
        tag.append_child(&paragraph)?;

        let style = tag.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", "0px")?;
        style.set_property("top", "0px")?;

        self.root.append_child(&tag)?;
        self.label = Some(tag);
        Ok(())
    }

    pub fn render(&self, placement: &LabelPlacement) -> Result<(), JsValue> {
        let Some(label) = &self.label else {
            return Ok(());
        };
        let style = label.style();
        style.set_property(
            "transform",
            &format!("translate(-50%,-50%) translate({}px,{}px)", placement.x, placement.y),
        )?;
        style.set_property("display", if placement.visible { "" } else { "none" })?;
        Ok(())
    }

    pub fn remove(&self) {
        self.root.remove();
    }
}
