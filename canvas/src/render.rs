//! Rendering: draws one image surface to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of the document, the surface camera and the
//! highlight state, and produces pixels. It does not mutate any application state.
//!
//! Everything is drawn in device pixels; CSS-pixel constants go through
//! [`Camera::device_px`]. All fallible `Canvas2D` calls propagate errors via
//! `Result<(), JsValue>`.

use std::f64::consts::{FRAC_PI_2, PI};

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::Camera;
use crate::consts::{
    PREVIEW_DASH_PX, PREVIEW_LINE_PX, REGION_CORNER_RADIUS_PX, REGION_EMPHASIS_LINE_PX, REGION_LINE_PX,
};
use crate::doc::{RegionDoc, RegionStatus};
use crate::engine::Surface;
use crate::geometry::Rect;
use crate::highlight::{Emphasis, HighlightController};

const IMAGE_ALPHA: f64 = 0.96;
const LETTERBOX_FILL: &str = "rgba(0,0,0,0.25)";
const EMPTY_FILL: &str = "rgba(255,255,255,0.05)";
const EMPTY_TEXT: &str = "rgba(255,255,255,0.75)";
const EMPTY_MESSAGE: &str = "Add an image to start marking cards.";
const PREVIEW_STROKE: &str = "rgba(255,255,255,0.95)";
const PREVIEW_FILL: &str = "rgba(255,255,255,0.10)";

/// Stroke and fill colors for a region status.
#[must_use]
pub fn status_colors(status: RegionStatus) -> (&'static str, &'static str) {
    match status {
        RegionStatus::Received => ("rgba(34,197,94,0.95)", "rgba(34,197,94,0.12)"),
        RegionStatus::FoundTrade => ("rgba(245,158,11,0.95)", "rgba(245,158,11,0.10)"),
        RegionStatus::Pending => ("rgba(167,139,250,0.95)", "rgba(167,139,250,0.10)"),
    }
}

/// Outline width in CSS pixels for a given emphasis.
#[must_use]
pub fn line_width_px(emphasis: Emphasis) -> f64 {
    match emphasis {
        Emphasis::None => REGION_LINE_PX,
        Emphasis::Hovered | Emphasis::Selected => REGION_EMPHASIS_LINE_PX,
        Emphasis::Focused { line_factor } => REGION_EMPHASIS_LINE_PX * line_factor,
    }
}

/// Draw the full surface: image, letterbox shading, regions, and drag preview.
///
/// `image` is `None` while the image is loading or after it failed to decode;
/// a placeholder is drawn and regions are skipped.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw_surface(
    ctx: &CanvasRenderingContext2d,
    surface: &Surface,
    image: Option<&HtmlImageElement>,
    doc: &RegionDoc,
    highlight: &HighlightController,
    now: f64,
) -> Result<(), JsValue> {
    let camera = &surface.camera;
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, camera.canvas_w, camera.canvas_h);

    let Some(image) = image.filter(|_| camera.image.is_some()) else {
        return draw_placeholder(ctx, camera);
    };

    let r = camera.draw_rect();
    ctx.save();
    ctx.set_global_alpha(IMAGE_ALPHA);
    ctx.draw_image_with_html_image_element_and_dw_and_dh(image, r.x, r.y, r.w, r.h)?;
    ctx.restore();

    draw_letterbox(ctx, camera, r);

    for region in doc.for_image(&surface.image_id) {
        let rr = camera.rect_to_display_space(&region.image_rect());
        let (stroke, fill) = status_colors(region.status());
        let emphasis = highlight.emphasis(&region.id, now);

        ctx.save();
        ctx.set_line_width(camera.device_px(line_width_px(emphasis)));
        ctx.set_stroke_style_str(stroke);
        ctx.set_fill_style_str(fill);
        rounded_rect_path(ctx, rr, camera.device_px(REGION_CORNER_RADIUS_PX))?;
        ctx.fill();
        ctx.stroke();
        ctx.restore();
    }

    if let Some(rr) = surface.selection.live_rect() {
        draw_preview(ctx, camera, rr)?;
    }

    Ok(())
}

fn draw_placeholder(ctx: &CanvasRenderingContext2d, camera: &Camera) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str(EMPTY_FILL);
    ctx.fill_rect(0.0, 0.0, camera.canvas_w, camera.canvas_h);
    ctx.set_fill_style_str(EMPTY_TEXT);
    ctx.set_font(&format!("{}px system-ui", (16.0 * camera.dpr).floor()));
    ctx.fill_text(EMPTY_MESSAGE, camera.device_px(18.0), camera.device_px(28.0))?;
    ctx.restore();
    Ok(())
}

/// Shade the four bands around the drawn image.
fn draw_letterbox(ctx: &CanvasRenderingContext2d, camera: &Camera, r: Rect) {
    let (cw, ch) = (camera.canvas_w, camera.canvas_h);
    ctx.save();
    ctx.set_fill_style_str(LETTERBOX_FILL);
    ctx.fill_rect(0.0, 0.0, cw, r.y);
    ctx.fill_rect(0.0, r.bottom(), cw, ch - r.bottom());
    ctx.fill_rect(0.0, r.y, r.x, r.h);
    ctx.fill_rect(r.right(), r.y, cw - r.right(), r.h);
    ctx.restore();
}

fn draw_preview(ctx: &CanvasRenderingContext2d, camera: &Camera, rr: Rect) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_line_width(camera.device_px(PREVIEW_LINE_PX));
    ctx.set_stroke_style_str(PREVIEW_STROKE);
    let dash_array = js_sys::Array::new();
    for dash in PREVIEW_DASH_PX {
        dash_array.push(&camera.device_px(dash).into());
    }
    ctx.set_line_dash(&dash_array)?;
    ctx.set_fill_style_str(PREVIEW_FILL);
    rounded_rect_path(ctx, rr, camera.device_px(REGION_CORNER_RADIUS_PX))?;
    ctx.fill();
    ctx.stroke();
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

/// Trace a rounded rectangle as a new path. The radius shrinks to fit small rects.
fn rounded_rect_path(ctx: &CanvasRenderingContext2d, r: Rect, radius: f64) -> Result<(), JsValue> {
    let rad = radius.min(r.w / 2.0).min(r.h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(r.x + rad, r.y);
    ctx.line_to(r.right() - rad, r.y);
    ctx.arc(r.right() - rad, r.y + rad, rad, -FRAC_PI_2, 0.0)?;
    ctx.line_to(r.right(), r.bottom() - rad);
    ctx.arc(r.right() - rad, r.bottom() - rad, rad, 0.0, FRAC_PI_2)?;
    ctx.line_to(r.x + rad, r.bottom());
    ctx.arc(r.x + rad, r.bottom() - rad, rad, FRAC_PI_2, PI)?;
    ctx.line_to(r.x, r.y + rad);
    ctx.arc(r.x + rad, r.y + rad, rad, PI, PI + FRAC_PI_2)?;
    ctx.close_path();
    Ok(())
}
