//! Image service: adding images to a collection, titles, and the image
//! cascade.
//!
//! DESIGN
//! ======
//! `index` is 1-based and contiguous per collection. New images append at
//! `max + 1`; deleting one renumbers the rest in their existing order. The
//! first image of an empty collection becomes its cover unless one is set.
//! Later images never touch the cover, so a cleared cover stays cleared.
//! Deleting the cover image hands the cover to the lowest-index survivor.
//!
//! Adding an image also lets a collection that was waiting on one finish its
//! data migration.

use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::rows::{IMAGE_COLUMNS, ImageRow, put_image};
use crate::error::StoreError;
use crate::model::{Image, default_image_title};
use crate::services::collection::{self, touch};
use crate::services::migration;
use crate::services::preview::probe_dimensions;

#[cfg(test)]
#[path = "image_test.rs"]
mod image_test;

pub(crate) const ENTITY: &str = "image";

/// Append an image to a collection. Dimensions are probed from `bytes`;
/// undecodable bytes are stored with unknown dimensions.
///
/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist.
pub async fn create_image(
    pool: &SqlitePool,
    clock: &Clock,
    collection_id: &str,
    bytes: Vec<u8>,
) -> Result<Image, StoreError> {
    let owner = collection::get_collection(pool, collection_id).await?;

    let max_index = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(idx) FROM images WHERE collection_id = ?")
        .bind(collection_id)
        .fetch_one(pool)
        .await?;
    let index = max_index.unwrap_or(0) + 1;

    let dims = probe_dimensions(&bytes);
    if dims.is_none() {
        warn!(collection_id = %collection_id, len = bytes.len(), "image bytes could not be decoded; dimensions unknown");
    }

    let now = clock.now_ms();
    let row = ImageRow {
        id: format!("part_{}", Uuid::new_v4()),
        collection_id: collection_id.to_owned(),
        idx: index,
        title: Some(default_image_title(index)),
        bytes,
        width: dims.map(|(w, _)| w),
        height: dims.map(|(_, h)| h),
        created_at: now,
        updated_at: now,
    };
    put_image(pool, &row).await?;

    if max_index.is_none() && owner.cover_image_id.is_none() {
        sqlx::query("UPDATE collections SET cover_image_id = ? WHERE id = ?")
            .bind(&row.id)
            .bind(collection_id)
            .execute(pool)
            .await?;
    }
    touch(pool, clock, collection_id).await?;
    if let Err(e) = migration::catch_up(pool, collection_id).await {
        warn!(collection_id = %collection_id, error = %e, "waiting regions not attached; will retry on next open");
    }

    info!(collection_id = %collection_id, image_id = %row.id, index, "image added");
    Ok(row.into_model())
}

/// Set or clear an image title. Blank titles clear it.
///
/// # Errors
///
/// Returns `NotFound` if the image doesn't exist.
pub async fn set_image_title(pool: &SqlitePool, clock: &Clock, id: &str, title: Option<&str>) -> Result<Image, StoreError> {
    let image = get_image(pool, id).await?;
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    sqlx::query("UPDATE images SET title = ?, updated_at = ? WHERE id = ?")
        .bind(title)
        .bind(clock.now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    touch(pool, clock, &image.collection_id).await?;
    get_image(pool, id).await
}

/// # Errors
///
/// Returns `NotFound` if the image doesn't exist.
pub async fn get_image(pool: &SqlitePool, id: &str) -> Result<Image, StoreError> {
    sqlx::query_as::<_, ImageRow>(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(ImageRow::into_model)
        .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

/// Images of a collection by index.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_images(pool: &SqlitePool, collection_id: &str) -> Result<Vec<Image>, StoreError> {
    let rows = sqlx::query_as::<_, ImageRow>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images WHERE collection_id = ? ORDER BY idx ASC, created_at ASC, id ASC"
    ))
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ImageRow::into_model).collect())
}

/// Delete an image and its regions, renumber the remaining images and move
/// the cover if it pointed here.
///
/// # Errors
///
/// Returns `NotFound` if the image doesn't exist.
pub async fn delete_image(pool: &SqlitePool, clock: &Clock, id: &str) -> Result<(), StoreError> {
    let image = get_image(pool, id).await?;
    let collection_id = image.collection_id.as_str();

    let regions = sqlx::query("DELETE FROM regions WHERE image_id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM images WHERE id = ?").bind(id).execute(pool).await?;

    let remaining = sqlx::query_as::<_, (String, i64)>(
        "SELECT id, idx FROM images WHERE collection_id = ? ORDER BY idx ASC, created_at ASC, id ASC",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    for (position, (image_id, idx)) in (1_i64..).zip(&remaining) {
        if *idx != position {
            sqlx::query("UPDATE images SET idx = ? WHERE id = ?")
                .bind(position)
                .bind(image_id)
                .execute(pool)
                .await?;
        }
    }

    let owner = collection::get_collection(pool, collection_id).await?;
    if owner.cover_image_id.as_deref() == Some(id) {
        let next_cover = remaining.first().map(|(image_id, _)| image_id.as_str());
        sqlx::query("UPDATE collections SET cover_image_id = ? WHERE id = ?")
            .bind(next_cover)
            .bind(collection_id)
            .execute(pool)
            .await?;
    }
    touch(pool, clock, collection_id).await?;

    info!(collection_id = %collection_id, image_id = %id, regions, "image deleted");
    Ok(())
}
