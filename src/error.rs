use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("missing DOM element: {0}")]
    MissingElement(&'static str),
    #[error("WebGL error: {0}")]
    WebGl(String),
    #[error("invalid scene config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("JavaScript error: {0}")]
    Js(String),
}

impl From<JsValue> for SceneError {
    fn from(value: JsValue) -> Self {
        SceneError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<SceneError> for JsValue {
    fn from(err: SceneError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
