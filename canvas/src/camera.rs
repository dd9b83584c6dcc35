#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, normalize};

/// A point in client, canvas or image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_drawable(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Contain-fit mapping between a canvas and the image drawn inside it.
///
/// `canvas_w` / `canvas_h` are the backing-store size in device pixels (CSS
/// size times `dpr`). The image is scaled to fit, centered, and letterboxed on
/// the other axis. With no image every conversion is the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub dpr: f64,
    pub image: Option<ImageSize>,
}

impl Default for Camera {
    fn default() -> Self {
        Self { canvas_w: 0.0, canvas_h: 0.0, dpr: 1.0, image: None }
    }
}

impl Camera {
    /// Build a camera from the canvas CSS size and device pixel ratio.
    /// The backing store is rounded to whole device pixels.
    #[must_use]
    pub fn from_css(css_w: f64, css_h: f64, dpr: f64, image: Option<ImageSize>) -> Self {
        let dpr = if dpr > 0.0 && dpr.is_finite() { dpr } else { 1.0 };
        Self { canvas_w: (css_w * dpr).round(), canvas_h: (css_h * dpr).round(), dpr, image }
    }

    /// The image size, if there is an image with a non-zero size.
    #[must_use]
    pub fn drawable_image(&self) -> Option<ImageSize> {
        self.image.filter(|img| img.is_drawable())
    }

    /// Image-to-canvas scale factor: `min(canvas_w / image_w, canvas_h / image_h)`.
    #[must_use]
    pub fn scale(&self) -> f64 {
        match self.drawable_image() {
            Some(img) => {
                let s = (self.canvas_w / img.width).min(self.canvas_h / img.height);
                if s > 0.0 { s } else { 1.0 }
            }
            None => 1.0,
        }
    }

    /// Where the image is drawn on the canvas, floored to whole device pixels.
    #[must_use]
    pub fn draw_rect(&self) -> Rect {
        let Some(img) = self.drawable_image() else {
            return Rect::new(0.0, 0.0, self.canvas_w, self.canvas_h);
        };
        let scale = self.scale();
        let dw = (img.width * scale).floor();
        let dh = (img.height * scale).floor();
        let dx = ((self.canvas_w - dw) / 2.0).floor();
        let dy = ((self.canvas_h - dh) / 2.0).floor();
        Rect::new(dx, dy, dw, dh)
    }

    /// Convert a client (CSS) position to device-pixel canvas coordinates.
    /// `origin` is the canvas's top-left corner in client coordinates.
    #[must_use]
    pub fn client_to_canvas(&self, client: Point, origin: Point) -> Point {
        Point { x: (client.x - origin.x) * self.dpr, y: (client.y - origin.y) * self.dpr }
    }

    /// Whether a canvas point falls on the drawn image. Always false with no image.
    #[must_use]
    pub fn contains(&self, canvas: Point) -> bool {
        self.drawable_image().is_some() && self.draw_rect().contains(canvas)
    }

    /// Map a canvas point into image pixel space, clamped to the image bounds.
    #[must_use]
    pub fn to_image_space(&self, canvas: Point) -> Point {
        let Some(img) = self.drawable_image() else {
            return canvas;
        };
        let scale = self.scale();
        let r = self.draw_rect();
        Point {
            x: ((canvas.x - r.x) / scale).clamp(0.0, img.width),
            y: ((canvas.y - r.y) / scale).clamp(0.0, img.height),
        }
    }

    /// Map an image pixel position onto the canvas. Not clamped.
    #[must_use]
    pub fn to_display_space(&self, image: Point) -> Point {
        if self.drawable_image().is_none() {
            return image;
        }
        let scale = self.scale();
        let r = self.draw_rect();
        Point { x: r.x + image.x * scale, y: r.y + image.y * scale }
    }

    /// Map a canvas rectangle into image space via its two corners.
    #[must_use]
    pub fn rect_to_image_space(&self, rect: &Rect) -> Rect {
        let a = self.to_image_space(Point::new(rect.x, rect.y));
        let b = self.to_image_space(Point::new(rect.right(), rect.bottom()));
        normalize(a.x, a.y, b.x, b.y)
    }

    /// Map an image-space rectangle onto the canvas.
    #[must_use]
    pub fn rect_to_display_space(&self, rect: &Rect) -> Rect {
        let a = self.to_display_space(Point::new(rect.x, rect.y));
        let b = self.to_display_space(Point::new(rect.right(), rect.bottom()));
        normalize(a.x, a.y, b.x, b.y)
    }

    /// Convert a CSS-pixel length to device pixels.
    #[must_use]
    pub fn device_px(&self, css: f64) -> f64 {
        (css * self.dpr).round()
    }
}
