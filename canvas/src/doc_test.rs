use super::*;

fn region(id: &str, image_id: &str, created_at: i64) -> RegionView {
    RegionView {
        id: id.to_owned(),
        image_id: image_id.to_owned(),
        rect: PixelRect::new(0, 0, 20, 20),
        found_trade: false,
        received: false,
        created_at,
    }
}

// =============================================================
// Status
// =============================================================

#[test]
fn status_from_flags() {
    let mut r = region("a", "img", 1);
    assert_eq!(r.status(), RegionStatus::Pending);
    r.found_trade = true;
    assert_eq!(r.status(), RegionStatus::FoundTrade);
    r.received = true;
    assert_eq!(r.status(), RegionStatus::Received);
}

#[test]
fn set_status_received_forces_found_trade() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "img", 1));
    assert!(doc.set_status("a", false, true));
    let r = doc.get("a").map(|r| (r.found_trade, r.received));
    assert_eq!(r, Some((true, true)));
}

#[test]
fn set_status_missing_region() {
    let mut doc = RegionDoc::new();
    assert!(!doc.set_status("nope", true, false));
}

// =============================================================
// Storage
// =============================================================

#[test]
fn insert_replaces_same_id() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "img", 1));
    let mut updated = region("a", "img", 1);
    updated.rect = PixelRect::new(5, 5, 30, 30);
    doc.insert(updated);
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.get("a").map(|r| r.rect), Some(PixelRect::new(5, 5, 30, 30)));
}

#[test]
fn remove_returns_region() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "img", 1));
    assert!(doc.remove("a").is_some());
    assert!(doc.remove("a").is_none());
    assert!(doc.is_empty());
}

#[test]
fn remove_image_only_touches_that_image() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "one", 1));
    doc.insert(region("b", "one", 2));
    doc.insert(region("c", "two", 3));
    assert_eq!(doc.remove_image("one"), 2);
    assert_eq!(doc.len(), 1);
    assert!(doc.get("c").is_some());
}

#[test]
fn for_image_orders_by_creation_then_id() {
    let mut doc = RegionDoc::new();
    doc.insert(region("z", "img", 1));
    doc.insert(region("b", "img", 3));
    doc.insert(region("a", "img", 1));
    doc.insert(region("x", "other", 0));
    let ids: Vec<&str> = doc.for_image("img").iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "z", "b"]);
}

#[test]
fn rects_for_image_are_float() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "img", 1));
    assert_eq!(doc.rects_for_image("img"), vec![Rect::new(0.0, 0.0, 20.0, 20.0)]);
    assert!(doc.rects_for_image("missing").is_empty());
}

// =============================================================
// Snapshots
// =============================================================

#[test]
fn load_snapshot_replaces_everything() {
    let mut doc = RegionDoc::new();
    doc.insert(region("old", "img", 1));
    doc.load_snapshot(vec![region("a", "img", 1), region("b", "img", 2)]);
    assert_eq!(doc.len(), 2);
    assert!(doc.get("old").is_none());
}

#[test]
fn load_snapshot_json_flattened_rect_and_defaults() {
    let mut doc = RegionDoc::new();
    let json = r#"[{"id":"r1","image_id":"i1","x":1,"y":2,"w":30,"h":40,"title":"ignored"}]"#;
    assert!(doc.load_snapshot_json(json).is_ok());
    let r = doc.get("r1");
    assert_eq!(r.map(|r| r.rect), Some(PixelRect::new(1, 2, 30, 40)));
    assert_eq!(r.map(RegionView::status), Some(RegionStatus::Pending));
    assert_eq!(r.map(|r| r.created_at), Some(0));
}

#[test]
fn load_snapshot_json_error_keeps_document() {
    let mut doc = RegionDoc::new();
    doc.insert(region("a", "img", 1));
    assert!(doc.load_snapshot_json("{not json").is_err());
    assert_eq!(doc.len(), 1);
}

#[test]
fn region_view_serializes_flat() {
    let value = serde_json::to_value(region("a", "img", 7)).unwrap_or_default();
    assert_eq!(value["x"], 0);
    assert_eq!(value["w"], 20);
    assert_eq!(value["created_at"], 7);
    assert!(value.get("rect").is_none());
}
