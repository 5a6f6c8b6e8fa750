//! `Surface` over a 2D canvas context.

#![allow(deprecated)] // web-sys Canvas API deprecation warnings

use std::f64::consts::FRAC_PI_2;

use bastion_core::config::TILE_SIZE;
use bastion_core::render::{Rect, Surface};
use bastion_core::Rotation;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

pub struct CanvasSurface<'a> {
    context: &'a CanvasRenderingContext2d,
    sheet: &'a HtmlImageElement,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(context: &'a CanvasRenderingContext2d, sheet: &'a HtmlImageElement) -> Self {
        Self { context, sheet }
    }
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self, width: f64, height: f64) {
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: &str, alpha: f64) {
        self.context.set_global_alpha(alpha);
        self.context.set_fill_style(&JsValue::from_str(color));
        self.context.fill_rect(rect.x, rect.y, rect.w, rect.h);
        self.context.set_global_alpha(1.0);
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str) {
        self.context.set_stroke_style(&JsValue::from_str(color));
        self.context.set_line_width(2.0);
        // Inset by half the line width so the outline stays inside the cell
        self.context
            .stroke_rect(rect.x + 1.0, rect.y + 1.0, rect.w - 2.0, rect.h - 2.0);
    }

    fn draw_sprite(&mut self, sprite: (u32, u32), dest: Rect, rotation: Rotation, alpha: f64) {
        let tile = f64::from(TILE_SIZE);
        let (sx, sy) = (f64::from(sprite.0) * tile, f64::from(sprite.1) * tile);

        self.context.save();
        self.context.set_global_alpha(alpha);
        let _ = self
            .context
            .translate(dest.x + dest.w / 2.0, dest.y + dest.h / 2.0);
        if rotation != Rotation::NONE {
            let _ = self
                .context
                .rotate(f64::from(rotation.quarter_turns()) * FRAC_PI_2);
        }
        let _ = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                self.sheet,
                sx,
                sy,
                tile,
                tile,
                -dest.w / 2.0,
                -dest.h / 2.0,
                dest.w,
                dest.h,
            );
        self.context.restore();
    }
}

/// 2D context of a canvas element.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// Size the backing store for `dpr` and draw in CSS pixels from here on.
///
/// Resizing a canvas resets its context state, so the transform and
/// smoothing flag are reapplied every time.
pub fn apply_backing_size(
    canvas: &HtmlCanvasElement,
    context: &CanvasRenderingContext2d,
    backing: (u32, u32),
    dpr: f64,
) {
    canvas.set_width(backing.0);
    canvas.set_height(backing.1);
    let _ = context.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    context.set_image_smoothing_enabled(false);
}
