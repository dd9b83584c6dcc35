#![allow(clippy::float_cmp)]

use super::*;
use crate::test_helpers::{png_bytes, test_store};

fn legacy_snapshot() -> CollectionSnapshot {
    CollectionSnapshot {
        collection: CollectionRow {
            id: "series_old".into(),
            name: "Old".into(),
            image_blob: Some(png_bytes(64, 48)),
            image_w: Some(640),
            image_h: Some(480),
            created_at: 100,
            updated_at: 200,
            ..CollectionRow::default()
        },
        images: Vec::new(),
        regions: vec![
            RegionRow {
                id: "card_b".into(),
                collection_id: "series_old".into(),
                x: 10,
                y: 10,
                w: 40,
                h: 40,
                received: true,
                created_at: 150,
                updated_at: 150,
                ..RegionRow::default()
            },
            RegionRow {
                id: "card_a".into(),
                collection_id: "series_old".into(),
                x: 100,
                y: 10,
                w: 40,
                h: 40,
                thumb_zoom: Some(12.0),
                created_at: 120,
                updated_at: 120,
                ..RegionRow::default()
            },
        ],
    }
}

// =============================================================================
// STEPS
// =============================================================================

#[test]
fn synthesize_moves_inline_image() {
    let mut snap = legacy_snapshot();
    assert!(MigrationStep::SynthesizeLegacyImage.apply(&mut snap));

    assert_eq!(snap.images.len(), 1);
    let image = &snap.images[0];
    assert_eq!(image.id, "series_old_part_1");
    assert_eq!((image.idx, image.title.as_deref()), (1, Some("Part 1")));
    assert_eq!((image.width, image.height), (Some(640), Some(480)));
    assert_eq!((image.created_at, image.updated_at), (100, 200));
    assert!(snap.collection.image_blob.is_none());
    assert_eq!(snap.collection.cover_image_id.as_deref(), Some("series_old_part_1"));
    assert!(snap.regions.iter().all(|r| r.image_id.as_deref() == Some("series_old_part_1")));
}

#[test]
fn synthesize_probes_when_legacy_size_missing() {
    let mut snap = legacy_snapshot();
    snap.collection.image_w = None;
    MigrationStep::SynthesizeLegacyImage.apply(&mut snap);
    assert_eq!((snap.images[0].width, snap.images[0].height), (Some(64), Some(48)));
}

#[test]
fn synthesize_without_blob_is_noop() {
    let mut snap = legacy_snapshot();
    snap.collection.image_blob = None;
    let before = snap.clone();
    assert!(!MigrationStep::SynthesizeLegacyImage.apply(&mut snap));
    assert_eq!(snap, before);
}

#[test]
fn orphans_attach_to_first_image() {
    let mut snap = legacy_snapshot();
    snap.collection.image_blob = None;
    snap.images = vec![
        ImageRow { id: "p2".into(), collection_id: "series_old".into(), idx: 2, ..ImageRow::default() },
        ImageRow { id: "p1".into(), collection_id: "series_old".into(), idx: 1, ..ImageRow::default() },
    ];
    snap.regions[0].image_id = Some("gone".into());
    assert!(MigrationStep::AttachOrphanRegions.apply(&mut snap));
    assert!(snap.regions.iter().all(|r| r.image_id.as_deref() == Some("p1")));
    assert!(!MigrationStep::AttachOrphanRegions.apply(&mut snap));
}

#[test]
fn orphans_without_images_are_kept() {
    let mut snap = legacy_snapshot();
    snap.collection.image_blob = None;
    let before = snap.regions.clone();

    assert!(upgrade(&mut snap).iter().all(|step| *step != MigrationStep::AttachOrphanRegions));
    assert_eq!(snap.regions.len(), before.len());
    assert!(snap.regions.iter().all(|r| r.image_id.is_none()));
    assert!(!is_settled(&snap));
}

#[test]
fn inline_image_is_kept_when_image_rows_exist() {
    let mut snap = legacy_snapshot();
    snap.images = vec![ImageRow { id: "p1".into(), collection_id: "series_old".into(), idx: 1, ..ImageRow::default() }];

    assert!(!MigrationStep::SynthesizeLegacyImage.apply(&mut snap));
    upgrade(&mut snap);
    assert!(snap.collection.image_blob.is_some());
    assert_eq!((snap.collection.image_w, snap.collection.image_h), (Some(640), Some(480)));
    assert_eq!(snap.images.len(), 1);
    assert!(is_settled(&snap));
}

#[test]
fn backfill_fills_and_repairs() {
    let mut snap = legacy_snapshot();
    MigrationStep::SynthesizeLegacyImage.apply(&mut snap);
    snap.collection.cover_zoom = Some(f64::NAN);
    assert!(MigrationStep::BackfillDefaults.apply(&mut snap));

    let c = &snap.collection;
    assert_eq!((c.cover_focus_x, c.cover_focus_y, c.cover_zoom), (Some(50.0), Some(50.0), Some(1.0)));
    let ids: Vec<_> = snap.regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["card_a", "card_b"]);
    let received = &snap.regions[1];
    assert!(received.found_trade && received.received);
    assert_eq!(received.note.as_deref(), Some(""));
    assert_eq!(snap.regions[0].thumb_zoom, Some(3.0));
}

#[test]
fn backfill_renumbers_and_fixes_dangling_cover() {
    let mut snap = legacy_snapshot();
    snap.collection.image_blob = None;
    snap.collection.cover_image_id = Some("deleted".into());
    snap.images = vec![
        ImageRow { id: "p9".into(), collection_id: "x".into(), idx: 9, ..ImageRow::default() },
        ImageRow { id: "p4".into(), collection_id: "series_old".into(), idx: 4, title: Some("Back".into()), ..ImageRow::default() },
    ];
    MigrationStep::BackfillDefaults.apply(&mut snap);

    let images: Vec<_> = snap.images.iter().map(|i| (i.id.as_str(), i.idx, i.title.as_deref())).collect();
    assert_eq!(images, [("p4", 1, Some("Back")), ("p9", 2, Some("Part 2"))]);
    assert!(snap.images.iter().all(|i| i.collection_id == "series_old"));
    assert_eq!(snap.collection.cover_image_id.as_deref(), Some("p4"));
}

#[test]
fn upgrade_is_idempotent() {
    let mut snap = legacy_snapshot();
    let applied = upgrade(&mut snap);
    assert_eq!(applied, [MigrationStep::SynthesizeLegacyImage, MigrationStep::BackfillDefaults]);
    let once = snap.clone();
    assert!(upgrade(&mut snap).is_empty());
    assert_eq!(snap, once);
}

#[test]
fn upgrade_is_deterministic() {
    let mut a = legacy_snapshot();
    let mut b = legacy_snapshot();
    upgrade(&mut a);
    upgrade(&mut b);
    assert_eq!(a, b);
}

// =============================================================================
// RUN
// =============================================================================

async fn insert_legacy(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO collections (id, name, image_blob, image_w, image_h, created_at, updated_at)
         VALUES ('series_old', 'Old', ?, NULL, NULL, 100, 200)",
    )
    .bind(png_bytes(64, 48))
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO regions (id, collection_id, x, y, w, h, found_trade, received, title, created_at, updated_at)
         VALUES ('card_1', 'series_old', 4, 4, 20, 20, 0, 1, 'Fox', 150, 150)",
    )
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn run_upgrades_legacy_rows() {
    let store = test_store().await;
    insert_legacy(store.pool()).await;

    let report = store.migrate().await.unwrap();
    assert_eq!(report, MigrationReport { pending: 1, upgraded: 1, ..MigrationReport::default() });

    let images = store.list_images("series_old").await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, "series_old_part_1");
    assert_eq!(images[0].dimensions(), Some((64, 48)));

    let regions = store.list_regions_for_collection("series_old").await.unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].image_id, "series_old_part_1");
    assert!(regions[0].found_trade);
    assert_eq!(regions[0].title.as_deref(), Some("Fox"));

    let c = store.get_collection("series_old").await.unwrap();
    assert_eq!(c.cover_image_id.as_deref(), Some("series_old_part_1"));
    let version = sqlx::query_scalar::<_, i64>("SELECT data_version FROM collections WHERE id = 'series_old'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(version, CURRENT_DATA_VERSION);
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let store = test_store().await;
    insert_legacy(store.pool()).await;
    store.migrate().await.unwrap();
    let regions = store.list_regions_for_collection("series_old").await.unwrap();

    assert_eq!(store.migrate().await.unwrap(), MigrationReport::default());
    assert_eq!(store.list_regions_for_collection("series_old").await.unwrap(), regions);
}

#[tokio::test]
async fn new_collections_are_already_current() {
    let store = test_store().await;
    store.create_collection(Some("Fresh")).await.unwrap();
    assert_eq!(store.migrate().await.unwrap().pending, 0);
}

async fn data_version(pool: &SqlitePool, id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT data_version FROM collections WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn region_rows(pool: &SqlitePool, id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM regions WHERE collection_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn regions_wait_for_an_image() {
    let store = test_store().await;
    sqlx::query("INSERT INTO collections (id, name, created_at, updated_at) VALUES ('series_bare', 'Bare', 100, 100)")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO regions (id, collection_id, x, y, w, h, created_at, updated_at)
         VALUES ('card_1', 'series_bare', 4, 4, 20, 20, 150, 150)",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let report = store.migrate().await.unwrap();
    assert_eq!(report.waiting, ["series_bare"]);
    assert_eq!(report.upgraded, 0);
    assert_eq!(region_rows(store.pool(), "series_bare").await, 1);
    assert!(data_version(store.pool(), "series_bare").await < CURRENT_DATA_VERSION);
    assert_eq!(store.migrate().await.unwrap().waiting, ["series_bare"]);

    let image = store.create_image("series_bare", png_bytes(64, 48)).await.unwrap();
    let regions = store.list_regions_for_collection("series_bare").await.unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].image_id, image.id);
    assert_eq!(data_version(store.pool(), "series_bare").await, CURRENT_DATA_VERSION);
}

#[tokio::test]
async fn one_failing_collection_does_not_block_the_rest() {
    let store = test_store().await;
    insert_legacy(store.pool()).await;
    sqlx::query(
        "INSERT INTO collections (id, name, image_blob, created_at, updated_at)
         VALUES ('series_bad', 'Bad', ?, 100, 200)",
    )
    .bind(png_bytes(32, 32))
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO regions (id, collection_id, x, y, w, h, created_at, updated_at)
         VALUES ('card_bad', 'series_bad', 1, 1, 10, 10, 150, 150)",
    )
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER block_bad_images BEFORE INSERT ON images
         WHEN NEW.collection_id = 'series_bad'
         BEGIN SELECT RAISE(ABORT, 'blocked'); END",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let report = store.migrate().await.unwrap();
    assert_eq!(report.pending, 2);
    assert_eq!(report.upgraded, 1);
    assert_eq!(report.failed, ["series_bad"]);

    let blob_kept = sqlx::query_scalar::<_, i64>("SELECT image_blob IS NOT NULL FROM collections WHERE id = 'series_bad'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(blob_kept, 1);
    assert_eq!(region_rows(store.pool(), "series_bad").await, 1);
    assert_eq!(data_version(store.pool(), "series_bad").await, 0);
    assert_eq!(store.list_images("series_old").await.unwrap().len(), 1);
    assert_eq!(data_version(store.pool(), "series_old").await, CURRENT_DATA_VERSION);
}
