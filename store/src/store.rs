//! The store facade.
//!
//! DESIGN
//! ======
//! `Store` bundles the pool, the timestamp clock, the config and the preview
//! worker, and forwards to the service modules. Opening a store runs the
//! schema migrations, then the data migration, then seeds the clock from the
//! newest `updated_at` on disk so fresh writes always sort last.

use canvas::crop::Focus;
use canvas::doc::RegionView;
use canvas::geometry::PixelRect;
use image::RgbaImage;
use sqlx::SqlitePool;
use tracing::warn;

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::db;
use crate::error::StoreError;
use crate::model::{Collection, Image, Progress, Region, RegionPatch};
use crate::services::migration::{self, MigrationReport};
use crate::services::preview::{FrameSize, PreviewKey, PreviewRequest, PreviewWorker, placeholder};
use crate::services::transfer::{self, ImportReport, InterchangeDocument, PayloadCodec};
use crate::services::image as image_service;
use crate::services::{collection, region};

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

pub struct Store {
    pool: SqlitePool,
    clock: Clock,
    config: StoreConfig,
    previews: PreviewWorker,
}

impl Store {
    /// Open (creating if needed) and migrate the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool can't be opened or the schema migration
    /// fails. Data migration failures are per collection and only logged.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let pool = db::init_pool(&config).await?;
        let report = migration::run(&pool).await?;
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "some collections are still on an old data version");
        }

        let clock = Clock::new();
        seed_clock(&pool, &clock).await?;

        Ok(Self { pool, clock, config, previews: PreviewWorker::new() })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn previews(&self) -> &PreviewWorker {
        &self.previews
    }

    /// Re-run the data migration over collections still behind.
    ///
    /// # Errors
    ///
    /// Returns a database error if the pending collections can't be listed.
    pub async fn migrate(&self) -> Result<MigrationReport, StoreError> {
        migration::run(&self.pool).await
    }

    // =========================================================================
    // COLLECTIONS
    // =========================================================================

    /// # Errors
    ///
    /// Returns a database error if a query fails.
    pub async fn create_collection(&self, name: Option<&str>) -> Result<Collection, StoreError> {
        collection::create_collection(&self.pool, &self.clock, name).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    pub async fn rename_collection(&self, id: &str, name: &str) -> Result<Collection, StoreError> {
        collection::rename_collection(&self.pool, &self.clock, id, name).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the collection or the image doesn't exist.
    pub async fn set_cover(
        &self,
        id: &str,
        image_id: Option<&str>,
        focus: Focus,
        zoom: f64,
    ) -> Result<Collection, StoreError> {
        collection::set_cover(&self.pool, &self.clock, id, image_id, focus, zoom).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    pub async fn get_collection(&self, id: &str) -> Result<Collection, StoreError> {
        collection::get_collection(&self.pool, id).await
    }

    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        collection::list_collections(&self.pool).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    pub async fn delete_collection(&self, id: &str) -> Result<(), StoreError> {
        collection::delete_collection(&self.pool, id).await
    }

    // =========================================================================
    // IMAGES
    // =========================================================================

    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    pub async fn create_image(&self, collection_id: &str, bytes: Vec<u8>) -> Result<Image, StoreError> {
        image_service::create_image(&self.pool, &self.clock, collection_id, bytes).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the image doesn't exist.
    pub async fn set_image_title(&self, id: &str, title: Option<&str>) -> Result<Image, StoreError> {
        image_service::set_image_title(&self.pool, &self.clock, id, title).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the image doesn't exist.
    pub async fn get_image(&self, id: &str) -> Result<Image, StoreError> {
        image_service::get_image(&self.pool, id).await
    }

    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_images(&self, collection_id: &str) -> Result<Vec<Image>, StoreError> {
        image_service::list_images(&self.pool, collection_id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the image doesn't exist.
    pub async fn delete_image(&self, id: &str) -> Result<(), StoreError> {
        image_service::delete_image(&self.pool, &self.clock, id).await
    }

    // =========================================================================
    // REGIONS
    // =========================================================================

    /// `Ok(None)` when the rectangle is rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the image doesn't exist.
    pub async fn create_region(&self, image_id: &str, rect: PixelRect) -> Result<Option<Region>, StoreError> {
        region::create_region(&self.pool, &self.clock, &self.config, image_id, rect).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the region doesn't exist.
    pub async fn update_region(&self, id: &str, patch: &RegionPatch) -> Result<Region, StoreError> {
        region::update_region(&self.pool, &self.clock, id, patch).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the region doesn't exist.
    pub async fn get_region(&self, id: &str) -> Result<Region, StoreError> {
        region::get_region(&self.pool, id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the region doesn't exist.
    pub async fn delete_region(&self, id: &str) -> Result<(), StoreError> {
        region::delete_region(&self.pool, &self.clock, id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the image doesn't exist.
    pub async fn delete_last_region(&self, image_id: &str) -> Result<Option<Region>, StoreError> {
        region::delete_last_region(&self.pool, &self.clock, image_id).await
    }

    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_regions_for_collection(&self, collection_id: &str) -> Result<Vec<Region>, StoreError> {
        region::list_regions_for_collection(&self.pool, collection_id).await
    }

    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_regions_for_image(&self, image_id: &str) -> Result<Vec<Region>, StoreError> {
        region::list_regions_for_image(&self.pool, image_id).await
    }

    /// Regions of a collection in the shape the canvas engine loads.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn region_views(&self, collection_id: &str) -> Result<Vec<RegionView>, StoreError> {
        let regions = self.list_regions_for_collection(collection_id).await?;
        Ok(regions.iter().map(RegionView::from).collect())
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the collection doesn't exist.
    pub async fn progress(&self, collection_id: &str) -> Result<Progress, StoreError> {
        region::progress(&self.pool, collection_id).await
    }

    // =========================================================================
    // PREVIEWS
    // =========================================================================

    /// Thumbnail of a region with its stored crop state. `Ok(None)` if a newer
    /// request for the same region superseded this one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the region or its image doesn't exist.
    pub async fn region_thumbnail(&self, region_id: &str) -> Result<Option<RgbaImage>, StoreError> {
        let region = self.get_region(region_id).await?;
        let image = self.get_image(&region.image_id).await?;
        let request = PreviewRequest {
            key: PreviewKey::Region(region.id),
            crop: Some(region.rect),
            frame: FrameSize::THUMB,
            focus: region.thumb_focus,
            zoom: region.thumb_zoom,
        };
        Ok(self.previews.render(image.bytes, request).await)
    }

    /// Cover of a collection. A collection without a cover gets the
    /// placeholder tile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the collection or its cover image doesn't exist.
    pub async fn collection_cover(&self, collection_id: &str) -> Result<Option<RgbaImage>, StoreError> {
        let owner = self.get_collection(collection_id).await?;
        let Some(cover_id) = owner.cover_image_id else {
            return Ok(Some(placeholder(FrameSize::COVER)));
        };
        let image = self.get_image(&cover_id).await?;
        let request = PreviewRequest {
            key: PreviewKey::Cover(owner.id),
            crop: None,
            frame: FrameSize::COVER,
            focus: owner.cover_focus,
            zoom: owner.cover_zoom,
        };
        Ok(self.previews.render(image.bytes, request).await)
    }

    // =========================================================================
    // INTERCHANGE
    // =========================================================================

    /// # Errors
    ///
    /// Returns a database error if a query fails.
    pub async fn export_document(&self, codec: &impl PayloadCodec) -> Result<InterchangeDocument, StoreError> {
        transfer::export_document(&self.pool, codec).await
    }

    /// Replace everything with `doc`.
    ///
    /// # Errors
    ///
    /// Returns `Payload` if an image payload can't be decoded, or a database
    /// error if the swap fails.
    pub async fn import_document(
        &self,
        doc: InterchangeDocument,
        codec: &impl PayloadCodec,
    ) -> Result<ImportReport, StoreError> {
        let report = transfer::import_document(&self.pool, doc, codec).await?;
        seed_clock(&self.pool, &self.clock).await?;
        Ok(report)
    }
}

async fn seed_clock(pool: &SqlitePool, clock: &Clock) -> Result<(), sqlx::Error> {
    for table in ["collections", "images", "regions"] {
        let newest = sqlx::query_scalar::<_, Option<i64>>(&format!("SELECT MAX(updated_at) FROM {table}"))
            .fetch_one(pool)
            .await?;
        if let Some(ts) = newest {
            clock.observe(ts);
        }
    }
    Ok(())
}
