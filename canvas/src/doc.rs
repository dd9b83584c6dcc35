//! Document model: the regions visible to the canvas and their in-memory store.
//!
//! The canvas never owns persistent state. The host hydrates a [`RegionDoc`]
//! from the region store (JSON or typed), forwards store mutations through
//! [`crate::engine::EngineCore`], and the selection machine and renderer read
//! from it. Only the fields the canvas needs are mirrored here; unknown fields
//! in incoming JSON are ignored.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, Rect};

/// Opaque region identifier assigned by the store.
pub type RegionId = String;

/// Opaque image identifier assigned by the store.
pub type ImageId = String;

/// Tracking status of a region, derived from its two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    /// Neither found nor received.
    Pending,
    /// A trade was found but the item has not arrived.
    FoundTrade,
    /// The item has been received.
    Received,
}

/// A region as the canvas sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    /// Store-assigned identifier.
    pub id: RegionId,
    /// Image the region was drawn on.
    pub image_id: ImageId,
    /// Integer geometry in the image's pixel space.
    #[serde(flatten)]
    pub rect: PixelRect,
    /// Whether a trade partner was found.
    #[serde(default)]
    pub found_trade: bool,
    /// Whether the item arrived.
    #[serde(default)]
    pub received: bool,
    /// Creation timestamp; orders regions and breaks hit-test ties.
    #[serde(default)]
    pub created_at: i64,
}

impl RegionView {
    #[must_use]
    pub fn status(&self) -> RegionStatus {
        if self.received {
            RegionStatus::Received
        } else if self.found_trade {
            RegionStatus::FoundTrade
        } else {
            RegionStatus::Pending
        }
    }

    /// Geometry as a floating-point image-space rectangle.
    #[must_use]
    pub fn image_rect(&self) -> Rect {
        self.rect.to_rect()
    }
}

/// In-memory store of regions across every image of the open collection.
#[derive(Debug, Default)]
pub struct RegionDoc {
    regions: HashMap<RegionId, RegionView>,
}

impl RegionDoc {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self { regions: HashMap::new() }
    }

    /// Insert or replace a region.
    pub fn insert(&mut self, region: RegionView) {
        self.regions.insert(region.id.clone(), region);
    }

    /// Remove a region by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<RegionView> {
        self.regions.remove(id)
    }

    /// Remove every region drawn on `image_id`. Returns how many were removed.
    pub fn remove_image(&mut self, image_id: &str) -> usize {
        let before = self.regions.len();
        self.regions.retain(|_, r| r.image_id != image_id);
        before - self.regions.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegionView> {
        self.regions.get(id)
    }

    /// Update the status flags of a region. Returns false if it doesn't exist.
    pub fn set_status(&mut self, id: &str, found_trade: bool, received: bool) -> bool {
        let Some(region) = self.regions.get_mut(id) else {
            return false;
        };
        region.found_trade = found_trade || received;
        region.received = received;
        true
    }

    /// Replace all regions with a full snapshot.
    pub fn load_snapshot(&mut self, regions: Vec<RegionView>) {
        self.regions.clear();
        for region in regions {
            self.regions.insert(region.id.clone(), region);
        }
    }

    /// Replace all regions from a JSON array produced by the store.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the payload isn't an array of regions; the
    /// document is left untouched in that case.
    pub fn load_snapshot_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let regions: Vec<RegionView> = serde_json::from_str(json)?;
        self.load_snapshot(regions);
        Ok(())
    }

    /// Regions drawn on `image_id`, oldest first.
    #[must_use]
    pub fn for_image(&self, image_id: &str) -> Vec<&RegionView> {
        let mut out: Vec<&RegionView> = self.regions.values().filter(|r| r.image_id == image_id).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Image-space rectangles of every region on `image_id`.
    #[must_use]
    pub fn rects_for_image(&self, image_id: &str) -> Vec<Rect> {
        self.for_image(image_id).into_iter().map(RegionView::image_rect).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
