//! Records returned by the store and the values derived from them.
//!
//! Ownership runs collection → image → region; a region's `collection_id`
//! is a denormalized copy of its image's. Timestamps are milliseconds from
//! [`crate::clock::Clock`].

use canvas::crop::{Focus, clamp_zoom};
use canvas::doc::RegionView;
use canvas::geometry::PixelRect;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

pub const UNTITLED: &str = "Untitled";
const COLLECTION_PREFIX: &str = "Collection";

// =============================================================================
// RECORDS
// =============================================================================

/// A named set of images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub cover_image_id: Option<String>,
    pub cover_focus: Focus,
    pub cover_zoom: f64,
}

impl Collection {
    /// Name for display: trimmed, or "Untitled" when blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

/// One raster image ("part") of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub collection_id: String,
    /// 1-based, contiguous within the collection.
    pub index: i64,
    pub title: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Image {
    /// Pixel size, when the bytes could be decoded.
    #[must_use]
    pub fn dimensions(&self) -> Option<(i64, i64)> {
        self.width.zip(self.height)
    }
}

/// A marked card on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub image_id: String,
    pub collection_id: String,
    #[serde(flatten)]
    pub rect: PixelRect,
    pub found_trade: bool,
    pub received: bool,
    pub title: Option<String>,
    pub note: String,
    pub thumb_focus: Focus,
    pub thumb_zoom: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Region> for RegionView {
    fn from(r: &Region) -> Self {
        Self {
            id: r.id.clone(),
            image_id: r.image_id.clone(),
            rect: r.rect,
            found_trade: r.found_trade,
            received: r.received,
            created_at: r.created_at,
        }
    }
}

// =============================================================================
// PATCHES
// =============================================================================

/// Partial update for a region. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionPatch {
    pub found_trade: Option<bool>,
    pub received: Option<bool>,
    /// `Some(None)` clears the title.
    pub title: Option<Option<String>>,
    pub note: Option<String>,
    pub thumb_focus: Option<Focus>,
    pub thumb_zoom: Option<f64>,
}

impl RegionPatch {
    /// Apply to `region`, keeping `received ⇒ found_trade`.
    ///
    /// `found_trade` is applied before `received`, so a patch carrying both
    /// `found_trade: false` and `received: true` ends with both set.
    pub fn apply(&self, region: &mut Region) {
        if let Some(found) = self.found_trade {
            region.found_trade = found;
            if !found {
                region.received = false;
            }
        }
        if let Some(received) = self.received {
            region.received = received;
            if received {
                region.found_trade = true;
            }
        }
        if let Some(title) = &self.title {
            region.title.clone_from(title);
        }
        if let Some(note) = &self.note {
            region.note.clone_from(note);
        }
        if let Some(focus) = self.thumb_focus {
            region.thumb_focus = focus.clamped();
        }
        if let Some(zoom) = self.thumb_zoom {
            region.thumb_zoom = clamp_zoom(zoom);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// DERIVED
// =============================================================================

/// Status counts for a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub found_trade: usize,
    pub received: usize,
    /// Regions not yet received.
    pub pending: usize,
    /// `received / total` as a rounded percentage; 0 for an empty collection.
    pub percent: u32,
}

impl Progress {
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_regions<'a, I>(regions: I) -> Self
    where
        I: IntoIterator<Item = &'a Region>,
    {
        let mut p = Self::default();
        for r in regions {
            p.total += 1;
            p.found_trade += usize::from(r.found_trade);
            p.received += usize::from(r.received);
        }
        p.pending = p.total - p.received;
        if p.total > 0 {
            p.percent = ((p.received as f64 / p.total as f64) * 100.0).round() as u32;
        }
        p
    }
}

/// Region list filter by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    FoundTrade,
    Received,
    /// Not yet received, whether or not a trade was found.
    Pending,
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, region: &Region) -> bool {
        match self {
            Self::All => true,
            Self::FoundTrade => region.found_trade,
            Self::Received => region.received,
            Self::Pending => !region.received,
        }
    }
}

/// Keep regions passing `status` and, when given, drawn on `image_id`.
#[must_use]
pub fn filter_regions<'a>(regions: &'a [Region], status: StatusFilter, image_id: Option<&str>) -> Vec<&'a Region> {
    regions
        .iter()
        .filter(|r| status.matches(r))
        .filter(|r| image_id.is_none_or(|id| r.image_id == id))
        .collect()
}

/// `"Card NN"` for the region at 0-based `position` in creation order.
#[must_use]
pub fn region_label(position: usize) -> String {
    format!("Card {:02}", position + 1)
}

/// Title given to a new image at 1-based `index`.
#[must_use]
pub fn default_image_title(index: i64) -> String {
    format!("Part {index}")
}

#[must_use]
pub fn display_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() { UNTITLED } else { trimmed }
}

/// Next free `"Collection N"` name: one more than the highest `N` already used.
#[must_use]
pub fn next_collection_name<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing.into_iter().filter_map(auto_name_number).max().unwrap_or(0);
    format!("{COLLECTION_PREFIX} {}", max.saturating_add(1))
}

/// `N` from a name shaped like `"Collection N"` (any case, any surrounding space).
fn auto_name_number(name: &str) -> Option<u64> {
    let name = name.trim();
    let (head, tail) = name.split_at_checked(COLLECTION_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(COLLECTION_PREFIX) {
        return None;
    }
    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let digits = tail.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
