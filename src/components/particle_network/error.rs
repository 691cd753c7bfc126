use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures raised while talking to the browser.
///
/// None of these ever reach the embedding page: the render loop counts them,
/// and mount failures switch the component to its static fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackdropError {
	/// No `window` global, e.g. outside a browser.
	#[error("no browser window available")]
	NoWindow,
	/// The canvas refused to hand out a 2D rendering context.
	#[error("2d rendering context unavailable")]
	ContextUnavailable,
	/// A browser call threw.
	#[error("browser call failed: {0}")]
	Js(String),
}

impl From<JsValue> for BackdropError {
	fn from(value: JsValue) -> Self {
		Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
