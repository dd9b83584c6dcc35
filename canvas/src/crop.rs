//! Cover-fit crop placement for region thumbnails and collection covers.
//!
//! A source image is scaled so it fully covers a fixed frame (cropping the
//! overflow, never letterboxing), optionally zoomed further, and panned by a
//! percentage focal point. [`place`] is the single source of truth for where a
//! crop comes from: thumbnails, covers and interactive pan/zoom dialogs all
//! call it, so identical inputs always produce identical previews.

#[cfg(test)]
#[path = "crop_test.rs"]
mod crop_test;

use serde::{Deserialize, Serialize};

use crate::consts::{FOCUS_CENTER, MAX_ZOOM, MIN_ZOOM};
use crate::geometry::Rect;

/// Focal point in percent of the overflow on each axis. `50/50` centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Focus {
    pub x: f64,
    pub y: f64,
}

impl Default for Focus {
    fn default() -> Self {
        Self { x: FOCUS_CENTER, y: FOCUS_CENTER }
    }
}

impl Focus {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[0, 100]`; non-finite values fall back to center.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { x: clamp_percent(self.x), y: clamp_percent(self.y) }
    }
}

/// Result of placing a source image into a frame.
///
/// The scaled image is drawn at `(-offset_x, -offset_y)` relative to the
/// frame's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlacement {
    pub frame_w: f64,
    pub frame_h: f64,
    pub scale: f64,
    pub scaled_w: f64,
    pub scaled_h: f64,
    pub overflow_x: f64,
    pub overflow_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Focal point actually applied, after clamping and zero-overflow centering.
    pub focus: Focus,
}

/// Place an `iw × ih` image into an `fw × fh` frame at `zoom` around `focus`.
///
/// Zoom below 1 is raised to 1. Degenerate sizes yield a placement with no
/// overflow and a centered focus.
#[must_use]
pub fn place(iw: f64, ih: f64, fw: f64, fh: f64, zoom: f64, focus: Focus) -> CropPlacement {
    let sizes_ok = [iw, ih, fw, fh].iter().all(|v| v.is_finite() && *v > 0.0);
    if !sizes_ok {
        return CropPlacement {
            frame_w: fw.max(0.0),
            frame_h: fh.max(0.0),
            scale: 1.0,
            scaled_w: iw.max(0.0),
            scaled_h: ih.max(0.0),
            overflow_x: 0.0,
            overflow_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            focus: Focus::default(),
        };
    }

    let zoom = if zoom.is_finite() { zoom.max(MIN_ZOOM) } else { MIN_ZOOM };
    let base_scale = (fw / iw).max(fh / ih);
    let scale = base_scale * zoom;
    let scaled_w = iw * scale;
    let scaled_h = ih * scale;
    let overflow_x = (scaled_w - fw).max(0.0);
    let overflow_y = (scaled_h - fh).max(0.0);

    let focus = focus.clamped();
    let fx = if overflow_x > 0.0 { focus.x } else { FOCUS_CENTER };
    let fy = if overflow_y > 0.0 { focus.y } else { FOCUS_CENTER };

    CropPlacement {
        frame_w: fw,
        frame_h: fh,
        scale,
        scaled_w,
        scaled_h,
        overflow_x,
        overflow_y,
        offset_x: overflow_x * (fx / 100.0),
        offset_y: overflow_y * (fy / 100.0),
        focus: Focus { x: fx, y: fy },
    }
}

impl CropPlacement {
    /// The window of the source image visible in the frame, in source pixels.
    #[must_use]
    pub fn source_rect(&self) -> Rect {
        if self.scale <= 0.0 {
            return Rect::default();
        }
        let src_w = self.scaled_w / self.scale;
        let src_h = self.scaled_h / self.scale;
        Rect::new(
            self.offset_x / self.scale,
            self.offset_y / self.scale,
            (self.frame_w / self.scale).min(src_w),
            (self.frame_h / self.scale).min(src_h),
        )
    }

    /// Focal point after dragging the image by `(dx, dy)` frame pixels.
    ///
    /// Dragging right reveals more of the left side, so the focus moves the
    /// other way. Axes without overflow stay centered.
    #[must_use]
    pub fn focus_after_drag(&self, dx: f64, dy: f64) -> Focus {
        let x = if self.overflow_x > 0.0 {
            clamp_percent(self.focus.x - dx / self.overflow_x * 100.0)
        } else {
            FOCUS_CENTER
        };
        let y = if self.overflow_y > 0.0 {
            clamp_percent(self.focus.y - dy / self.overflow_y * 100.0)
        } else {
            FOCUS_CENTER
        };
        Focus { x, y }
    }
}

/// Clamp a zoom factor into the supported `[MIN_ZOOM, MAX_ZOOM]` range.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { MIN_ZOOM }
}

/// Apply a wheel or slider delta to a zoom factor.
#[must_use]
pub fn zoom_step(zoom: f64, delta: f64) -> f64 {
    clamp_zoom(zoom + delta)
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { FOCUS_CENTER }
}
