//! 2D-canvas rasterizer for the HUD panel.
//!
//! The layout comes from the engine as a [`HudFrame`]; this module only turns
//! it into RGBA bytes with the browser's text renderer.

use compact_str::{CompactString, format_compact};
use corelight_core::sim::{HudColor, HudFont, HudFrame};
use wasm_bindgen::prelude::*;
use web_sys::{OffscreenCanvas, OffscreenCanvasRenderingContext2d};

use crate::error::Error;

const FONT_FAMILY: &str = "Inter, system-ui";

/// Offscreen 2D canvas sized to the HUD raster.
pub(crate) struct HudCanvas {
    // kept alive for the context
    _canvas: OffscreenCanvas,
    render_ctx: OffscreenCanvasRenderingContext2d,
    size: (u32, u32),
}

impl HudCanvas {
    pub(crate) fn new(width: u32, height: u32) -> Result<Self, Error> {
        let (width, height) = (width.max(1), height.max(1));
        let canvas = OffscreenCanvas::new(width, height)
            .map_err(|e| Error::hud_canvas_creation_failed(js_error_string(&e)))?;

        let ctx = canvas
            .get_context("2d")
            .map_err(|e| Error::hud_canvas_creation_failed(js_error_string(&e)))?
            .ok_or_else(Error::hud_context_failed)?
            .dyn_into::<OffscreenCanvasRenderingContext2d>()
            .map_err(|_| Error::hud_context_failed())?;

        ctx.set_text_baseline("alphabetic");
        ctx.set_text_align("left");

        Ok(Self { _canvas: canvas, render_ctx: ctx, size: (width, height) })
    }

    /// Clears the raster, draws every line and the scan-line overlay, and
    /// returns the resulting RGBA pixels, top row first.
    pub(crate) fn rasterize(&self, frame: &HudFrame) -> Result<Vec<u8>, Error> {
        let ctx = &self.render_ctx;
        let (w, h) = (self.size.0 as f64, self.size.1 as f64);

        ctx.clear_rect(0.0, 0.0, w, h);

        for line in &frame.lines {
            ctx.set_font(&font_string(line.font));
            ctx.set_fill_style_str(&css_color(line.color));
            ctx.fill_text(&line.text, line.x as f64, line.y as f64)
                .map_err(|e| Error::hud_raster_failed(js_error_string(&e)))?;
        }

        let scanlines = frame.scanlines;
        ctx.set_fill_style_str(&css_color(scanlines.color));
        for y in (0..self.size.1).step_by(scanlines.spacing.max(1) as usize) {
            ctx.fill_rect(0.0, y as f64, w, 1.0);
        }

        let image = ctx
            .get_image_data(0.0, 0.0, w, h)
            .map_err(|e| Error::hud_raster_failed(js_error_string(&e)))?;

        Ok(image.data().0)
    }
}

/// CSS font shorthand for a HUD line, e.g. `700 20px Inter, system-ui`.
pub(crate) fn font_string(font: HudFont) -> CompactString {
    format_compact!("{} {}px {FONT_FAMILY}", font.weight, font.size_px)
}

/// CSS `rgba()` color for a HUD line.
pub(crate) fn css_color(color: HudColor) -> CompactString {
    format_compact!("rgba({},{},{},{})", color.r, color.g, color.b, color.a)
}

fn js_error_string(err: &JsValue) -> String {
    err.as_string()
        .unwrap_or_else(|| format!("{err:?}"))
}

impl std::fmt::Debug for HudCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HudCanvas")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_strings() {
        assert_eq!(font_string(HudFont::LABEL), "700 20px Inter, system-ui");
        assert_eq!(font_string(HudFont::READOUT), "600 16px Inter, system-ui");
    }

    #[test]
    fn test_css_colors() {
        assert_eq!(css_color(HudColor::rgba(170, 230, 255, 0.95)), "rgba(170,230,255,0.95)");
        assert_eq!(css_color(HudColor::rgba(80, 140, 255, 0.05)), "rgba(80,140,255,0.05)");
        assert_eq!(css_color(HudColor::rgba(0, 0, 0, 1.0)), "rgba(0,0,0,1)");
    }
}
