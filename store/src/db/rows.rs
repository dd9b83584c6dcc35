//! Raw table rows.
//!
//! Rows mirror the columns exactly, including the nullable columns added by
//! later schema revisions and the legacy inline image. They are what data
//! migration steps and the interchange document work on; services convert
//! them into the strict [`crate::model`] records on the way out.

use canvas::consts::FOCUS_CENTER;
use canvas::crop::{Focus, clamp_zoom};
use canvas::geometry::PixelRect;
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;

use crate::model::{Collection, Image, Region};

pub(crate) const COLLECTION_COLUMNS: &str = "id, name, image_blob, image_w, image_h, created_at, updated_at, \
     cover_image_id, cover_focus_x, cover_focus_y, cover_zoom, data_version";

pub(crate) const IMAGE_COLUMNS: &str = "id, collection_id, idx, title, bytes, width, height, created_at, updated_at";

pub(crate) const REGION_COLUMNS: &str = "id, collection_id, image_id, x, y, w, h, found_trade, received, title, note, \
     thumb_focus_x, thumb_focus_y, thumb_zoom, created_at, updated_at";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Inline image of the single-image layout.
    #[serde(skip)]
    pub image_blob: Option<Vec<u8>>,
    pub image_w: Option<i64>,
    pub image_h: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    pub cover_image_id: Option<String>,
    pub cover_focus_x: Option<f64>,
    pub cover_focus_y: Option<f64>,
    pub cover_zoom: Option<f64>,
    #[serde(default)]
    pub data_version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageRow {
    pub id: String,
    pub collection_id: String,
    #[serde(default, rename = "index")]
    pub idx: i64,
    pub title: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegionRow {
    pub id: String,
    pub collection_id: String,
    pub image_id: Option<String>,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    #[serde(default)]
    pub found_trade: bool,
    #[serde(default)]
    pub received: bool,
    pub title: Option<String>,
    pub note: Option<String>,
    pub thumb_focus_x: Option<f64>,
    pub thumb_focus_y: Option<f64>,
    pub thumb_zoom: Option<f64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn focus_from(x: Option<f64>, y: Option<f64>) -> Focus {
    Focus::new(x.unwrap_or(FOCUS_CENTER), y.unwrap_or(FOCUS_CENTER)).clamped()
}

impl CollectionRow {
    #[must_use]
    pub fn into_model(self) -> Collection {
        Collection {
            cover_focus: focus_from(self.cover_focus_x, self.cover_focus_y),
            cover_zoom: clamp_zoom(self.cover_zoom.unwrap_or(1.0)),
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cover_image_id: self.cover_image_id,
        }
    }
}

impl ImageRow {
    #[must_use]
    pub fn into_model(self) -> Image {
        Image {
            id: self.id,
            collection_id: self.collection_id,
            index: self.idx,
            title: self.title,
            bytes: self.bytes,
            width: self.width,
            height: self.height,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl RegionRow {
    /// Strict record, or `None` for a region not yet attached to an image.
    #[must_use]
    pub fn into_model(self) -> Option<Region> {
        Some(Region {
            image_id: self.image_id?,
            thumb_focus: focus_from(self.thumb_focus_x, self.thumb_focus_y),
            thumb_zoom: clamp_zoom(self.thumb_zoom.unwrap_or(1.0)),
            rect: PixelRect::new(self.x, self.y, self.w, self.h),
            found_trade: self.found_trade || self.received,
            received: self.received,
            note: self.note.unwrap_or_default(),
            id: self.id,
            collection_id: self.collection_id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    #[must_use]
    pub fn from_model(r: &Region) -> Self {
        Self {
            id: r.id.clone(),
            collection_id: r.collection_id.clone(),
            image_id: Some(r.image_id.clone()),
            x: r.rect.x,
            y: r.rect.y,
            w: r.rect.w,
            h: r.rect.h,
            found_trade: r.found_trade,
            received: r.received,
            title: r.title.clone(),
            note: Some(r.note.clone()),
            thumb_focus_x: Some(r.thumb_focus.x),
            thumb_focus_y: Some(r.thumb_focus.y),
            thumb_zoom: Some(r.thumb_zoom),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// =============================================================================
// WRITES
// =============================================================================

/// Insert or replace a collection row.
pub(crate) async fn put_collection<'e, E>(exec: E, row: &CollectionRow) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT OR REPLACE INTO collections
            (id, name, image_blob, image_w, image_h, created_at, updated_at,
             cover_image_id, cover_focus_x, cover_focus_y, cover_zoom, data_version)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.name)
    .bind(row.image_blob.as_deref())
    .bind(row.image_w)
    .bind(row.image_h)
    .bind(row.created_at)
    .bind(row.updated_at)
    .bind(row.cover_image_id.as_deref())
    .bind(row.cover_focus_x)
    .bind(row.cover_focus_y)
    .bind(row.cover_zoom)
    .bind(row.data_version)
    .execute(exec)
    .await?;
    Ok(())
}

/// Insert or replace an image row.
pub(crate) async fn put_image<'e, E>(exec: E, row: &ImageRow) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT OR REPLACE INTO images (id, collection_id, idx, title, bytes, width, height, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.collection_id)
    .bind(row.idx)
    .bind(row.title.as_deref())
    .bind(&row.bytes)
    .bind(row.width)
    .bind(row.height)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// Insert or replace a region row.
pub(crate) async fn put_region<'e, E>(exec: E, row: &RegionRow) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT OR REPLACE INTO regions
            (id, collection_id, image_id, x, y, w, h, found_trade, received, title, note,
             thumb_focus_x, thumb_focus_y, thumb_zoom, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.collection_id)
    .bind(row.image_id.as_deref())
    .bind(row.x)
    .bind(row.y)
    .bind(row.w)
    .bind(row.h)
    .bind(row.found_trade)
    .bind(row.received)
    .bind(row.title.as_deref())
    .bind(row.note.as_deref())
    .bind(row.thumb_focus_x)
    .bind(row.thumb_focus_y)
    .bind(row.thumb_zoom)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}
