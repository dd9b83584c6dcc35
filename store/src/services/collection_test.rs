#![allow(clippy::float_cmp)]

use canvas::crop::Focus;
use canvas::geometry::PixelRect;

use crate::error::StoreError;
use crate::test_helpers::{png_bytes, seed_image, test_store};

#[tokio::test]
async fn blank_names_are_numbered() {
    let store = test_store().await;
    let first = store.create_collection(None).await.unwrap();
    let second = store.create_collection(Some("   ")).await.unwrap();
    assert_eq!(first.name, "Collection 1");
    assert_eq!(second.name, "Collection 2");
    assert!(first.id.starts_with("series_"));
}

#[tokio::test]
async fn names_are_trimmed() {
    let store = test_store().await;
    let c = store.create_collection(Some("  Foxes ")).await.unwrap();
    assert_eq!(c.name, "Foxes");
    let renamed = store.rename_collection(&c.id, " Wolves  ").await.unwrap();
    assert_eq!(renamed.name, "Wolves");
    assert!(renamed.updated_at > c.updated_at);
}

#[tokio::test]
async fn rename_missing_is_not_found() {
    let store = test_store().await;
    let err = store.rename_collection("series_nope", "x").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "collection", .. }));
    assert_eq!(err.error_code(), "E_NOT_FOUND");
}

#[tokio::test]
async fn list_puts_recent_edits_first() {
    let store = test_store().await;
    let a = store.create_collection(Some("A")).await.unwrap();
    let b = store.create_collection(Some("B")).await.unwrap();
    let names: Vec<_> = store.list_collections().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["B", "A"]);

    store.create_image(&a.id, png_bytes(40, 40)).await.unwrap();
    let names: Vec<_> = store.list_collections().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["A", "B"]);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn set_cover_clamps_crop_state() {
    let store = test_store().await;
    let image = seed_image(&store, 64, 48).await;
    let c = store
        .set_cover(&image.collection_id, Some(&image.id), Focus::new(-10.0, 250.0), 7.5)
        .await
        .unwrap();
    assert_eq!(c.cover_image_id.as_deref(), Some(image.id.as_str()));
    assert_eq!(c.cover_focus, Focus::new(0.0, 100.0));
    assert_eq!(c.cover_zoom, 3.0);

    let cleared = store.set_cover(&c.id, None, Focus::default(), 1.0).await.unwrap();
    assert!(cleared.cover_image_id.is_none());
}

#[tokio::test]
async fn set_cover_rejects_foreign_image() {
    let store = test_store().await;
    let image = seed_image(&store, 64, 48).await;
    let other = store.create_collection(Some("Other")).await.unwrap();
    let err = store.set_cover(&other.id, Some(&image.id), Focus::default(), 1.0).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "image", .. }));
}

#[tokio::test]
async fn delete_cascades_to_images_and_regions() {
    let store = test_store().await;
    let image = seed_image(&store, 200, 200).await;
    store.create_region(&image.id, PixelRect::new(10, 10, 50, 50)).await.unwrap().unwrap();
    let keep = seed_image(&store, 100, 100).await;

    store.delete_collection(&image.collection_id).await.unwrap();

    assert!(store.get_collection(&image.collection_id).await.is_err());
    assert!(store.get_image(&image.id).await.is_err());
    assert!(store.list_regions_for_image(&image.id).await.unwrap().is_empty());
    assert_eq!(store.list_images(&keep.collection_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_missing_is_not_found() {
    let store = test_store().await;
    assert!(matches!(store.delete_collection("series_x").await, Err(StoreError::NotFound { .. })));
}
