//! Data migration from the single-image layout to images-per-collection.
//!
//! DESIGN
//! ======
//! The schema DDL is handled by `sqlx::migrate!`; this module fixes up the
//! rows. Each step is a pure function over a [`CollectionSnapshot`], applied
//! in [`STEPS`] order. Steps are idempotent and derive everything they create
//! from the snapshot itself (ids from the collection id, timestamps from the
//! collection), so upgrading the same snapshot twice yields the same rows.
//!
//! [`run`] upgrades every collection whose `data_version` is behind, one
//! transaction per collection. Imported documents go through [`upgrade`] too.
//!
//! ERROR HANDLING
//! ==============
//! A collection that fails to migrate is rolled back, logged at `warn`, and
//! left at its old `data_version` to be retried on the next open. The other
//! collections still migrate.
//!
//! Nothing is deleted. Regions with no image to attach to stay as they are,
//! and the collection stays behind until [`catch_up`] finds an image for them.

use std::collections::HashSet;

use canvas::consts::FOCUS_CENTER;
use canvas::crop::{Focus, clamp_zoom};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::rows::{
    IMAGE_COLUMNS, ImageRow, REGION_COLUMNS, RegionRow, CollectionRow, put_collection, put_image, put_region,
};
use crate::error::StoreError;
use crate::model::default_image_title;
use crate::services::collection::fetch_row;
use crate::services::preview::probe_dimensions;

#[cfg(test)]
#[path = "migration_test.rs"]
mod migration_test;

/// `data_version` of a fully migrated collection.
pub const CURRENT_DATA_VERSION: i64 = 1;

/// All rows belonging to one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    pub collection: CollectionRow,
    pub images: Vec<ImageRow>,
    pub regions: Vec<RegionRow>,
}

/// One data migration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Move the collection's inline image into an image row and attach the
    /// image-less regions to it.
    SynthesizeLegacyImage,
    /// Point regions without a valid image at the collection's first image.
    AttachOrphanRegions,
    /// Fill and clamp optional columns, renumber images, and repair the
    /// status flags and cover reference.
    BackfillDefaults,
}

/// Steps in application order.
pub const STEPS: [MigrationStep; 3] = [
    MigrationStep::SynthesizeLegacyImage,
    MigrationStep::AttachOrphanRegions,
    MigrationStep::BackfillDefaults,
];

impl MigrationStep {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SynthesizeLegacyImage => "synthesize_legacy_image",
            Self::AttachOrphanRegions => "attach_orphan_regions",
            Self::BackfillDefaults => "backfill_defaults",
        }
    }

    /// Apply the step. Returns whether anything changed.
    pub fn apply(self, snap: &mut CollectionSnapshot) -> bool {
        match self {
            Self::SynthesizeLegacyImage => synthesize_legacy_image(snap),
            Self::AttachOrphanRegions => attach_orphan_regions(snap),
            Self::BackfillDefaults => backfill_defaults(snap),
        }
    }
}

/// Run every step over `snap`, returning the steps that changed something.
pub fn upgrade(snap: &mut CollectionSnapshot) -> Vec<MigrationStep> {
    STEPS.into_iter().filter(|step| step.apply(snap)).collect()
}

/// Id of the image synthesized from a collection's inline image.
#[must_use]
pub fn legacy_image_id(collection_id: &str) -> String {
    format!("{collection_id}_part_1")
}

// =============================================================================
// STEPS
// =============================================================================

fn synthesize_legacy_image(snap: &mut CollectionSnapshot) -> bool {
    if !snap.images.is_empty() {
        if snap.collection.image_blob.is_some() {
            debug!(collection_id = %snap.collection.id, "image rows present; inline image left in place");
        }
        return false;
    }
    let Some(blob) = snap.collection.image_blob.take() else {
        return false;
    };
    let legacy_dims = (snap.collection.image_w.take(), snap.collection.image_h.take());

    let dims = match legacy_dims {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => probe_dimensions(&blob),
    };
    let id = legacy_image_id(&snap.collection.id);
    snap.images.push(ImageRow {
        id: id.clone(),
        collection_id: snap.collection.id.clone(),
        idx: 1,
        title: Some(default_image_title(1)),
        bytes: blob,
        width: dims.map(|(w, _)| w),
        height: dims.map(|(_, h)| h),
        created_at: snap.collection.created_at,
        updated_at: snap.collection.updated_at,
    });

    for region in snap.regions.iter_mut().filter(|r| r.image_id.is_none()) {
        region.image_id = Some(id.clone());
    }
    if snap.collection.cover_image_id.is_none() {
        snap.collection.cover_image_id = Some(id);
    }
    true
}

fn attach_orphan_regions(snap: &mut CollectionSnapshot) -> bool {
    let Some(first) = first_image(&snap.images).map(|i| i.id.clone()) else {
        return false;
    };
    let known: HashSet<&str> = snap.images.iter().map(|i| i.id.as_str()).collect();
    let is_orphan = |r: &RegionRow| r.image_id.as_deref().is_none_or(|id| !known.contains(id));

    let mut changed = false;
    for region in &mut snap.regions {
        if is_orphan(&*region) {
            region.image_id = Some(first.clone());
            changed = true;
        }
    }
    changed
}

/// Whether every region of `snap` points at one of its images. A collection
/// that isn't settled stays behind [`CURRENT_DATA_VERSION`] so its orphans
/// attach once an image exists.
#[must_use]
pub fn is_settled(snap: &CollectionSnapshot) -> bool {
    let known: HashSet<&str> = snap.images.iter().map(|i| i.id.as_str()).collect();
    snap.regions
        .iter()
        .all(|r| r.image_id.as_deref().is_some_and(|id| known.contains(id)))
}

fn backfill_defaults(snap: &mut CollectionSnapshot) -> bool {
    let before = snap.clone();
    let collection_id = snap.collection.id.clone();

    snap.images
        .sort_by(|a, b| (a.idx, a.created_at, &a.id).cmp(&(b.idx, b.created_at, &b.id)));
    for (index, image) in (1_i64..).zip(snap.images.iter_mut()) {
        image.idx = index;
        image.collection_id.clone_from(&collection_id);
        if image.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            image.title = Some(default_image_title(index));
        }
    }

    let c = &mut snap.collection;
    if c.image_blob.is_none() {
        c.image_w = None;
        c.image_h = None;
    }
    let focus = backfill_focus(c.cover_focus_x, c.cover_focus_y);
    c.cover_focus_x = Some(focus.x);
    c.cover_focus_y = Some(focus.y);
    c.cover_zoom = Some(clamp_zoom(c.cover_zoom.unwrap_or(1.0)));
    let cover_dangles = c.cover_image_id.as_deref().is_some_and(|id| !snap.images.iter().any(|i| i.id == id));
    if cover_dangles {
        c.cover_image_id = snap.images.first().map(|i| i.id.clone());
    }

    for region in &mut snap.regions {
        region.collection_id.clone_from(&collection_id);
        if region.note.is_none() {
            region.note = Some(String::new());
        }
        let focus = backfill_focus(region.thumb_focus_x, region.thumb_focus_y);
        region.thumb_focus_x = Some(focus.x);
        region.thumb_focus_y = Some(focus.y);
        region.thumb_zoom = Some(clamp_zoom(region.thumb_zoom.unwrap_or(1.0)));
        if region.received {
            region.found_trade = true;
        }
    }
    snap.regions
        .sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    *snap != before
}

fn backfill_focus(x: Option<f64>, y: Option<f64>) -> Focus {
    Focus::new(x.unwrap_or(FOCUS_CENTER), y.unwrap_or(FOCUS_CENTER)).clamped()
}

fn first_image(images: &[ImageRow]) -> Option<&ImageRow> {
    images.iter().min_by(|a, b| (a.idx, a.created_at, &a.id).cmp(&(b.idx, b.created_at, &b.id)))
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Outcome of a [`run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Collections found behind the current data version.
    pub pending: usize,
    /// Collections brought up to date.
    pub upgraded: usize,
    /// Collections that failed and were left for the next run.
    pub failed: Vec<String>,
    /// Collections whose regions have no image to attach to yet.
    pub waiting: Vec<String>,
}

/// Upgrade every collection behind [`CURRENT_DATA_VERSION`].
///
/// # Errors
///
/// Returns a database error only if the pending collections can't be listed.
/// Per-collection failures are reported in [`MigrationReport::failed`].
pub async fn run(pool: &SqlitePool) -> Result<MigrationReport, StoreError> {
    let pending = sqlx::query_scalar::<_, String>("SELECT id FROM collections WHERE data_version < ? ORDER BY id")
        .bind(CURRENT_DATA_VERSION)
        .fetch_all(pool)
        .await?;

    let mut report = MigrationReport { pending: pending.len(), ..MigrationReport::default() };
    for id in pending {
        match migrate_collection(pool, &id).await {
            Ok(Migrated { settled: false, .. }) => {
                debug!(collection_id = %id, "regions wait for an image; collection stays behind");
                report.waiting.push(id);
            }
            Ok(Migrated { steps, .. }) => {
                let steps: Vec<&str> = steps.into_iter().map(MigrationStep::name).collect();
                debug!(collection_id = %id, ?steps, "collection migrated");
                report.upgraded += 1;
            }
            Err(e) => {
                warn!(collection_id = %id, error = %e, "collection migration failed; will retry on next open");
                report.failed.push(id);
            }
        }
    }

    if report.pending > 0 {
        info!(
            upgraded = report.upgraded,
            waiting = report.waiting.len(),
            failed = report.failed.len(),
            "data migration finished"
        );
    }
    Ok(report)
}

/// Result of migrating one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migrated {
    pub steps: Vec<MigrationStep>,
    /// Whether the collection reached [`CURRENT_DATA_VERSION`].
    pub settled: bool,
}

async fn migrate_collection(pool: &SqlitePool, id: &str) -> Result<Migrated, StoreError> {
    let mut tx = pool.begin().await?;
    let Some(mut snap) = load_snapshot(&mut *tx, id).await? else {
        return Ok(Migrated { steps: Vec::new(), settled: true });
    };
    let steps = upgrade(&mut snap);
    write_snapshot(&mut *tx, &snap).await?;
    tx.commit().await?;
    Ok(Migrated { steps, settled: is_settled(&snap) })
}

/// Migrate `id` if it is still behind, e.g. once its first image lands.
///
/// # Errors
///
/// Returns a database error if the collection can't be read or rewritten.
pub async fn catch_up(pool: &SqlitePool, id: &str) -> Result<Option<Migrated>, StoreError> {
    let version = sqlx::query_scalar::<_, i64>("SELECT data_version FROM collections WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match version {
        Some(v) if v < CURRENT_DATA_VERSION => Ok(Some(migrate_collection(pool, id).await?)),
        _ => Ok(None),
    }
}

/// Read a collection with all of its rows.
pub(crate) async fn load_snapshot(conn: &mut SqliteConnection, id: &str) -> Result<Option<CollectionSnapshot>, sqlx::Error> {
    let Some(collection) = fetch_row(&mut *conn, id).await? else {
        return Ok(None);
    };
    let images = sqlx::query_as::<_, ImageRow>(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE collection_id = ?"))
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    let regions =
        sqlx::query_as::<_, RegionRow>(&format!("SELECT {REGION_COLUMNS} FROM regions WHERE collection_id = ?"))
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(Some(CollectionSnapshot { collection, images, regions }))
}

/// Replace a collection's rows with `snap`. It is marked current only when
/// [`is_settled`]; otherwise it keeps its old `data_version`.
pub(crate) async fn write_snapshot(conn: &mut SqliteConnection, snap: &CollectionSnapshot) -> Result<(), sqlx::Error> {
    let id = snap.collection.id.as_str();
    sqlx::query("DELETE FROM regions WHERE collection_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM images WHERE collection_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let data_version = if is_settled(snap) {
        CURRENT_DATA_VERSION
    } else {
        snap.collection.data_version.min(CURRENT_DATA_VERSION - 1)
    };
    let collection = CollectionRow { data_version, ..snap.collection.clone() };
    put_collection(&mut *conn, &collection).await?;
    for image in &snap.images {
        put_image(&mut *conn, image).await?;
    }
    for region in &snap.regions {
        put_region(&mut *conn, region).await?;
    }
    Ok(())
}
