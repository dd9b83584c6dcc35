use crate::error::StoreError;
use crate::test_helpers::{png_bytes, seed_image, test_store};

#[tokio::test]
async fn images_append_with_probed_dimensions() {
    let store = test_store().await;
    let first = seed_image(&store, 120, 80).await;
    let second = store.create_image(&first.collection_id, png_bytes(30, 20)).await.unwrap();

    assert_eq!((first.index, second.index), (1, 2));
    assert_eq!(first.dimensions(), Some((120, 80)));
    assert_eq!(second.title.as_deref(), Some("Part 2"));
    assert!(second.id.starts_with("part_"));
}

#[tokio::test]
async fn first_image_becomes_cover() {
    let store = test_store().await;
    let first = seed_image(&store, 40, 40).await;
    store.create_image(&first.collection_id, png_bytes(40, 40)).await.unwrap();
    let c = store.get_collection(&first.collection_id).await.unwrap();
    assert_eq!(c.cover_image_id.as_deref(), Some(first.id.as_str()));
}

#[tokio::test]
async fn cleared_cover_stays_cleared_when_images_are_added() {
    let store = test_store().await;
    let first = seed_image(&store, 40, 40).await;
    store
        .set_cover(&first.collection_id, None, canvas::crop::Focus::default(), 1.0)
        .await
        .unwrap();
    store.create_image(&first.collection_id, png_bytes(40, 40)).await.unwrap();

    let c = store.get_collection(&first.collection_id).await.unwrap();
    assert!(c.cover_image_id.is_none());
}

#[tokio::test]
async fn undecodable_bytes_store_unknown_dimensions() {
    let store = test_store().await;
    let c = store.create_collection(None).await.unwrap();
    let image = store.create_image(&c.id, b"not an image".to_vec()).await.unwrap();
    assert_eq!(image.dimensions(), None);
    assert_eq!(store.get_image(&image.id).await.unwrap().bytes, b"not an image");
}

#[tokio::test]
async fn create_in_missing_collection_is_not_found() {
    let store = test_store().await;
    let err = store.create_image("series_missing", png_bytes(4, 4)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "collection", .. }));
}

#[tokio::test]
async fn titles_set_and_clear() {
    let store = test_store().await;
    let image = seed_image(&store, 40, 40).await;
    let titled = store.set_image_title(&image.id, Some("  Front ")).await.unwrap();
    assert_eq!(titled.title.as_deref(), Some("Front"));
    let cleared = store.set_image_title(&image.id, Some("  ")).await.unwrap();
    assert!(cleared.title.is_none());
}

#[tokio::test]
async fn delete_renumbers_and_moves_cover() {
    let store = test_store().await;
    let first = seed_image(&store, 40, 40).await;
    let cid = first.collection_id.clone();
    let second = store.create_image(&cid, png_bytes(40, 40)).await.unwrap();
    let third = store.create_image(&cid, png_bytes(40, 40)).await.unwrap();

    store.delete_image(&first.id).await.unwrap();

    let images = store.list_images(&cid).await.unwrap();
    let order: Vec<_> = images.iter().map(|i| (i.id.as_str(), i.index)).collect();
    assert_eq!(order, [(second.id.as_str(), 1), (third.id.as_str(), 2)]);
    let c = store.get_collection(&cid).await.unwrap();
    assert_eq!(c.cover_image_id.as_deref(), Some(second.id.as_str()));
}

#[tokio::test]
async fn deleting_last_image_clears_cover_and_regions() {
    let store = test_store().await;
    let image = seed_image(&store, 100, 100).await;
    store
        .create_region(&image.id, canvas::geometry::PixelRect::new(0, 0, 20, 20))
        .await
        .unwrap()
        .unwrap();

    store.delete_image(&image.id).await.unwrap();

    let c = store.get_collection(&image.collection_id).await.unwrap();
    assert!(c.cover_image_id.is_none());
    assert!(store.list_regions_for_collection(&c.id).await.unwrap().is_empty());
}
