//! Region service: validated creation, patches, undo and ordered listing.
//!
//! DESIGN
//! ======
//! `create_region` re-checks everything the canvas already checked (minimum
//! size, dedup against the image's regions) plus the image bounds, in image
//! pixels. Refusals are `Ok(None)` and logged at debug; they are expected
//! outcomes of a drag, not failures.

use canvas::crop::Focus;
use canvas::geometry::{PixelRect, best_overlap, is_duplicate};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::db::rows::{REGION_COLUMNS, RegionRow, put_region};
use crate::error::StoreError;
use crate::model::{Progress, Region, RegionPatch};
use crate::services::collection::{self, touch};
use crate::services::image;

#[cfg(test)]
#[path = "region_test.rs"]
mod region_test;

pub(crate) const ENTITY: &str = "region";

/// Why a rectangle was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooSmall,
    OutOfBounds,
    Duplicate { overlap: f64 },
}

/// Check a rectangle against the size rule and, when known, the image bounds.
#[must_use]
pub fn validate_rect(rect: PixelRect, min_px: i64, dims: Option<(i64, i64)>) -> Option<Rejection> {
    if rect.w < min_px || rect.h < min_px {
        return Some(Rejection::TooSmall);
    }
    let in_bounds = match dims {
        Some((width, height)) => rect.fits_within(width, height),
        None => rect.x >= 0 && rect.y >= 0,
    };
    if !in_bounds {
        return Some(Rejection::OutOfBounds);
    }
    None
}

/// Create a region on an image.
///
/// Returns `Ok(None)` when the rectangle is too small, leaves the image, or
/// overlaps an existing region of the same image by the dedup threshold.
///
/// # Errors
///
/// Returns `NotFound` if the image doesn't exist.
pub async fn create_region(
    pool: &SqlitePool,
    clock: &Clock,
    config: &StoreConfig,
    image_id: &str,
    rect: PixelRect,
) -> Result<Option<Region>, StoreError> {
    let image = image::get_image(pool, image_id).await?;

    if let Some(rejection) = validate_rect(rect, config.min_region_px, image.dimensions()) {
        debug!(image_id = %image_id, ?rect, ?rejection, "region rejected");
        return Ok(None);
    }

    let existing: Vec<_> = list_regions_for_image(pool, image_id).await?.iter().map(|r| r.rect.to_rect()).collect();
    let overlap = best_overlap(&rect.to_rect(), &existing);
    if is_duplicate(overlap, config.dedup_threshold) {
        debug!(image_id = %image_id, ?rect, rejection = ?Rejection::Duplicate { overlap }, "region rejected");
        return Ok(None);
    }

    let now = clock.now_ms();
    let region = Region {
        id: format!("card_{}", Uuid::new_v4()),
        image_id: image.id.clone(),
        collection_id: image.collection_id.clone(),
        rect,
        found_trade: false,
        received: false,
        title: None,
        note: String::new(),
        thumb_focus: Focus::default(),
        thumb_zoom: 1.0,
        created_at: now,
        updated_at: now,
    };
    put_region(pool, &RegionRow::from_model(&region)).await?;
    touch(pool, clock, &region.collection_id).await?;

    info!(region_id = %region.id, image_id = %image_id, ?rect, "region created");
    Ok(Some(region))
}

/// Apply a patch to a region.
///
/// # Errors
///
/// Returns `NotFound` if the region doesn't exist.
pub async fn update_region(pool: &SqlitePool, clock: &Clock, id: &str, patch: &RegionPatch) -> Result<Region, StoreError> {
    let mut region = get_region(pool, id).await?;
    if patch.is_empty() {
        return Ok(region);
    }
    patch.apply(&mut region);
    region.updated_at = clock.now_ms();
    put_region(pool, &RegionRow::from_model(&region)).await?;
    touch(pool, clock, &region.collection_id).await?;
    Ok(region)
}

/// # Errors
///
/// Returns `NotFound` if the region doesn't exist.
pub async fn get_region(pool: &SqlitePool, id: &str) -> Result<Region, StoreError> {
    sqlx::query_as::<_, RegionRow>(&format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .and_then(RegionRow::into_model)
        .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

/// # Errors
///
/// Returns `NotFound` if the region doesn't exist.
pub async fn delete_region(pool: &SqlitePool, clock: &Clock, id: &str) -> Result<(), StoreError> {
    let region = get_region(pool, id).await?;
    sqlx::query("DELETE FROM regions WHERE id = ?").bind(id).execute(pool).await?;
    touch(pool, clock, &region.collection_id).await?;
    debug!(region_id = %id, "region deleted");
    Ok(())
}

/// Undo: delete the most recently created region on an image.
/// Returns the deleted region, or `None` if the image has none.
///
/// # Errors
///
/// Returns `NotFound` if the image doesn't exist.
pub async fn delete_last_region(pool: &SqlitePool, clock: &Clock, image_id: &str) -> Result<Option<Region>, StoreError> {
    image::get_image(pool, image_id).await?;
    let Some(last) = list_regions_for_image(pool, image_id).await?.pop() else {
        return Ok(None);
    };
    delete_region(pool, clock, &last.id).await?;
    Ok(Some(last))
}

/// Regions of a collection, oldest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_regions_for_collection(pool: &SqlitePool, collection_id: &str) -> Result<Vec<Region>, StoreError> {
    let rows = sqlx::query_as::<_, RegionRow>(&format!(
        "SELECT {REGION_COLUMNS} FROM regions
         WHERE collection_id = ? AND image_id IN (SELECT id FROM images WHERE collection_id = ?)
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(collection_id)
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(RegionRow::into_model).collect())
}

/// Regions of an image, oldest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_regions_for_image(pool: &SqlitePool, image_id: &str) -> Result<Vec<Region>, StoreError> {
    let rows = sqlx::query_as::<_, RegionRow>(&format!(
        "SELECT {REGION_COLUMNS} FROM regions WHERE image_id = ? ORDER BY created_at ASC, id ASC"
    ))
    .bind(image_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(RegionRow::into_model).collect())
}

/// Status counts for a collection.
///
/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist.
pub async fn progress(pool: &SqlitePool, collection_id: &str) -> Result<Progress, StoreError> {
    collection::get_collection(pool, collection_id).await?;
    let regions = list_regions_for_collection(pool, collection_id).await?;
    Ok(Progress::from_regions(&regions))
}
