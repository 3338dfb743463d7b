use js_sys::wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, Window};

use crate::error::Error;

pub(crate) fn window() -> Result<Window, Error> {
    web_sys::window().ok_or(Error::window_not_found())
}

pub(crate) fn document() -> Result<Document, Error> {
    window().and_then(|w| w.document().ok_or(Error::document_not_found()))
}

/// Looks up an element by CSS selector; `None` if it does not exist (yet).
pub(crate) fn query_element(selector: &str) -> Option<Element> {
    document()
        .ok()?
        .query_selector(selector)
        .ok()
        .flatten()
}

/// Creates a detached canvas that fills its container without taking input.
pub(crate) fn create_backdrop_canvas(document: &Document) -> Result<HtmlCanvasElement, Error> {
    let canvas = document
        .create_element("canvas")
        .map_err(|_| Error::canvas_creation_failed())?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| Error::canvas_creation_failed())?;

    let style = canvas.style();
    for (property, value) in [
        ("position", "absolute"),
        ("inset", "0"),
        ("width", "100%"),
        ("height", "100%"),
        ("display", "block"),
        ("pointer-events", "none"),
    ] {
        let _ = style.set_property(property, value);
    }

    Ok(canvas)
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn get_webgl2_context(
    canvas: &HtmlCanvasElement,
) -> Result<web_sys::WebGl2RenderingContext, Error> {
    canvas
        .get_context("webgl2")
        .map_err(|_| Error::canvas_context_failed())?
        .ok_or(Error::webgl_context_failed())?
        .dyn_into::<web_sys::WebGl2RenderingContext>()
        .map_err(|_| Error::webgl_context_failed())
}

/// Creates a glow context from the WebGL2 context of the given canvas.
///
/// The raw WebGL2 context is also returned for `is_context_lost()` checks.
#[cfg(target_arch = "wasm32")]
pub(crate) fn create_glow_context(
    canvas: &HtmlCanvasElement,
) -> Result<(glow::Context, web_sys::WebGl2RenderingContext), Error> {
    let webgl2_ctx = get_webgl2_context(canvas)?;
    let gl = glow::Context::from_webgl2_context(webgl2_ctx.clone());
    Ok((gl, webgl2_ctx))
}

/// Host builds (clippy, unit tests) have no WebGL2.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn create_glow_context(
    _canvas: &HtmlCanvasElement,
) -> Result<(glow::Context, web_sys::WebGl2RenderingContext), Error> {
    Err(Error::webgl_context_failed())
}

/// Returns the current device pixel ratio, or 1.0 if unavailable.
pub(crate) fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// High-resolution time in milliseconds, on the same clock as
/// `requestAnimationFrame` timestamps.
pub(crate) fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or_else(js_sys::Date::now, |p| p.now())
}

/// Client size of an element in CSS pixels; negative values count as zero.
pub(crate) fn client_size(element: &Element) -> (u32, u32) {
    (element.client_width().max(0) as u32, element.client_height().max(0) as u32)
}

/// A seed drawn from `Math.random()`.
pub(crate) fn random_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}
