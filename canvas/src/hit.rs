#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::doc::{RegionDoc, RegionId};

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub region_id: RegionId,
}

/// Find the region of `image_id` under a canvas point.
///
/// Regions are tested in display space so letterbox clamping can't pull an
/// outside point onto an edge. When regions overlap, the most recently
/// created one wins since it is drawn on top.
#[must_use]
pub fn hit_test(doc: &RegionDoc, image_id: &str, camera: &Camera, canvas_pt: Point) -> Option<Hit> {
    if camera.image.is_none() {
        return None;
    }
    doc.for_image(image_id)
        .into_iter()
        .rev()
        .find(|r| camera.rect_to_display_space(&r.image_rect()).contains(canvas_pt))
        .map(|r| Hit { region_id: r.id.clone() })
}
