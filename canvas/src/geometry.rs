//! Rectangle math shared by selection, dedup and rendering.
//!
//! Everything here is pure. Rectangles are axis-aligned and stored as
//! top-left corner plus size; [`normalize`] is the only way a drag becomes a
//! rectangle, so width and height are never negative downstream.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;

/// Axis-aligned rectangle in either display or image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Integer rectangle in image pixel space, as persisted for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        normalize(a.x, a.y, b.x, b.y)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Area, treating negative extents as empty.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Whether `p` lies inside or on the edge of this rectangle.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Overlapping area of two rectangles. Disjoint inputs give a zero-size
    /// rectangle anchored at the nearer corner, never a negative size.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        Self { x: x1, y: y1, w: (x2 - x1).max(0.0), h: (y2 - y1).max(0.0) }
    }

    /// Whether both sides reach `min`. Applied in display space, before any
    /// conversion, so the threshold stays perceptual.
    #[must_use]
    pub fn is_valid(&self, min: f64) -> bool {
        self.w >= min && self.h >= min
    }

    /// Snap both corners to the nearest integer pixel, so a rect that ends on
    /// an image edge still ends there.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded(&self) -> PixelRect {
        let (x1, y1) = (self.x.round() as i64, self.y.round() as i64);
        let (x2, y2) = (self.right().round() as i64, self.bottom().round() as i64);
        PixelRect { x: x1, y: y1, w: x2 - x1, h: y2 - y1 }
    }
}

impl PixelRect {
    #[must_use]
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_rect(&self) -> Rect {
        Rect { x: self.x as f64, y: self.y as f64, w: self.w as f64, h: self.h as f64 }
    }

    /// Clip to a `width × height` image.
    #[must_use]
    pub fn clamped_to(&self, width: i64, height: i64) -> Self {
        let x1 = self.x.clamp(0, width);
        let y1 = self.y.clamp(0, height);
        let x2 = (self.x + self.w).clamp(0, width);
        let y2 = (self.y + self.h).clamp(0, height);
        Self { x: x1, y: y1, w: x2 - x1, h: y2 - y1 }
    }

    /// Whether the rectangle sits entirely inside a `width × height` image.
    #[must_use]
    pub fn fits_within(&self, width: i64, height: i64) -> bool {
        self.x >= 0 && self.y >= 0 && self.x + self.w <= width && self.y + self.h <= height
    }
}

/// Build a rectangle from two corner coordinates regardless of drag direction.
#[must_use]
pub fn normalize(x1: f64, y1: f64, x2: f64, y2: f64) -> Rect {
    Rect { x: x1.min(x2), y: y1.min(y2), w: (x2 - x1).abs(), h: (y2 - y1).abs() }
}

/// Fraction of `candidate`'s area covered by `existing`.
///
/// Returns 0 for a zero-area candidate.
#[must_use]
pub fn overlap_ratio(candidate: &Rect, existing: &Rect) -> f64 {
    let area = candidate.area();
    if area <= 0.0 {
        return 0.0;
    }
    candidate.intersect(existing).area() / area
}

/// Highest [`overlap_ratio`] of `candidate` against any of `existing`.
#[must_use]
pub fn best_overlap<'a, I>(candidate: &Rect, existing: I) -> f64
where
    I: IntoIterator<Item = &'a Rect>,
{
    existing
        .into_iter()
        .map(|r| overlap_ratio(candidate, r))
        .fold(0.0, f64::max)
}

/// Whether a best-overlap value marks the candidate as a near-duplicate.
/// The threshold is inclusive.
#[must_use]
pub fn is_duplicate(best: f64, threshold: f64) -> bool {
    best >= threshold
}
