//! Collection service: create, rename, cover selection, listing and the
//! cascading delete.
//!
//! DESIGN
//! ======
//! Every mutation reachable from a collection bumps its `updated_at` through
//! [`touch`], so "recently edited" ordering in [`list_collections`] reflects
//! image and region edits too, not just renames.
//!
//! ERROR HANDLING
//! ==============
//! The cascade deletes regions, then images, then the collection, as separate
//! statements. A failure part-way leaves a consistent prefix deleted (children
//! before parents) and the call can simply be retried.

use canvas::crop::{Focus, clamp_zoom};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::rows::{COLLECTION_COLUMNS, CollectionRow, put_collection};
use crate::error::StoreError;
use crate::model::{Collection, next_collection_name};
use crate::services::migration::CURRENT_DATA_VERSION;

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;

pub(crate) const ENTITY: &str = "collection";

/// Create a collection. A blank or missing name becomes the next free
/// `"Collection N"`.
///
/// # Errors
///
/// Returns a database error if a query fails.
pub async fn create_collection(pool: &SqlitePool, clock: &Clock, name: Option<&str>) -> Result<Collection, StoreError> {
    let trimmed = name.map(str::trim).unwrap_or_default();
    let name = if trimmed.is_empty() {
        let existing = sqlx::query_scalar::<_, String>("SELECT name FROM collections")
            .fetch_all(pool)
            .await?;
        next_collection_name(existing.iter().map(String::as_str))
    } else {
        trimmed.to_owned()
    };

    let now = clock.now_ms();
    let row = CollectionRow {
        id: format!("series_{}", Uuid::new_v4()),
        name,
        created_at: now,
        updated_at: now,
        data_version: CURRENT_DATA_VERSION,
        ..CollectionRow::default()
    };
    put_collection(pool, &row).await?;
    info!(collection_id = %row.id, name = %row.name, "collection created");
    Ok(row.into_model())
}

/// Rename a collection. The name is stored trimmed.
///
/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist.
pub async fn rename_collection(pool: &SqlitePool, clock: &Clock, id: &str, name: &str) -> Result<Collection, StoreError> {
    let result = sqlx::query("UPDATE collections SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name.trim())
        .bind(clock.now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(ENTITY, id));
    }
    get_collection(pool, id).await
}

/// Set or clear the cover image and its crop state.
///
/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist, or if `image_id`
/// doesn't name an image of this collection.
pub async fn set_cover(
    pool: &SqlitePool,
    clock: &Clock,
    id: &str,
    image_id: Option<&str>,
    focus: Focus,
    zoom: f64,
) -> Result<Collection, StoreError> {
    get_collection(pool, id).await?;
    if let Some(image_id) = image_id {
        let owned = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE id = ? AND collection_id = ?")
            .bind(image_id)
            .bind(id)
            .fetch_one(pool)
            .await?;
        if owned == 0 {
            return Err(StoreError::not_found(crate::services::image::ENTITY, image_id));
        }
    }

    let focus = focus.clamped();
    sqlx::query(
        "UPDATE collections
         SET cover_image_id = ?, cover_focus_x = ?, cover_focus_y = ?, cover_zoom = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(image_id)
    .bind(focus.x)
    .bind(focus.y)
    .bind(clamp_zoom(zoom))
    .bind(clock.now_ms())
    .bind(id)
    .execute(pool)
    .await?;
    get_collection(pool, id).await
}

/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist.
pub async fn get_collection(pool: &SqlitePool, id: &str) -> Result<Collection, StoreError> {
    fetch_row(pool, id)
        .await?
        .map(CollectionRow::into_model)
        .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

pub(crate) async fn fetch_row<'e, E>(exec: E, id: &str) -> Result<Option<CollectionRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, CollectionRow>(&format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?"))
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// All collections, most recently updated first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_collections(pool: &SqlitePool) -> Result<Vec<Collection>, StoreError> {
    let rows = sqlx::query_as::<_, CollectionRow>(&format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY updated_at DESC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(CollectionRow::into_model).collect())
}

/// Delete a collection with all of its images and regions.
///
/// # Errors
///
/// Returns `NotFound` if the collection doesn't exist.
pub async fn delete_collection(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    get_collection(pool, id).await?;

    let regions = sqlx::query("DELETE FROM regions WHERE collection_id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    let images = sqlx::query("DELETE FROM images WHERE collection_id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM collections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    info!(collection_id = %id, images, regions, "collection deleted");
    Ok(())
}

/// Bump a collection's `updated_at` after a change to one of its children.
pub(crate) async fn touch<'e, E>(exec: E, clock: &Clock, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE collections SET updated_at = ? WHERE id = ?")
        .bind(clock.now_ms())
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}
