#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// normalize
// =============================================================

#[test]
fn normalize_is_direction_independent() {
    let expected = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(normalize(10.0, 20.0, 40.0, 60.0), expected);
    assert_eq!(normalize(40.0, 60.0, 10.0, 20.0), expected);
    assert_eq!(normalize(40.0, 20.0, 10.0, 60.0), expected);
    assert_eq!(normalize(10.0, 60.0, 40.0, 20.0), expected);
}

#[test]
fn normalize_zero_drag_is_empty() {
    let r = normalize(5.0, 5.0, 5.0, 5.0);
    assert_eq!(r, Rect::new(5.0, 5.0, 0.0, 0.0));
    assert_eq!(r.area(), 0.0);
}

#[test]
fn from_corners_matches_normalize() {
    let r = Rect::from_corners(Point::new(7.0, 3.0), Point::new(1.0, 9.0));
    assert_eq!(r, normalize(7.0, 3.0, 1.0, 9.0));
}

// =============================================================
// validity
// =============================================================

#[test]
fn valid_at_exact_minimum() {
    assert!(Rect::new(0.0, 0.0, 12.0, 12.0).is_valid(12.0));
}

#[test]
fn invalid_when_either_side_short() {
    assert!(!Rect::new(0.0, 0.0, 11.9, 50.0).is_valid(12.0));
    assert!(!Rect::new(0.0, 0.0, 50.0, 11.0).is_valid(12.0));
}

// =============================================================
// intersection / area
// =============================================================

#[test]
fn intersect_overlapping() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 5.0, 10.0, 10.0);
    assert_eq!(a.intersect(&b), Rect::new(5.0, 5.0, 5.0, 5.0));
}

#[test]
fn intersect_disjoint_has_zero_area() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, 20.0, 5.0, 5.0);
    let i = a.intersect(&b);
    assert_eq!(i.w, 0.0);
    assert_eq!(i.h, 0.0);
    assert_eq!(i.area(), 0.0);
}

#[test]
fn intersect_touching_edges_has_zero_area() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(10.0, 0.0, 10.0, 10.0);
    assert_eq!(a.intersect(&b).area(), 0.0);
}

#[test]
fn area_ignores_negative_extent() {
    assert_eq!(Rect::new(0.0, 0.0, -5.0, 10.0).area(), 0.0);
}

#[test]
fn contains_is_edge_inclusive() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(r.contains(Point::new(30.0, 30.0)));
    assert!(!r.contains(Point::new(30.1, 20.0)));
}

// =============================================================
// overlap / dedup
// =============================================================

#[test]
fn overlap_ratio_is_relative_to_candidate() {
    let big = Rect::new(0.0, 0.0, 100.0, 100.0);
    let small = Rect::new(10.0, 10.0, 10.0, 10.0);
    assert_eq!(overlap_ratio(&small, &big), 1.0);
    assert!((overlap_ratio(&big, &small) - 0.01).abs() < 1e-12);
}

#[test]
fn overlap_ratio_zero_area_candidate() {
    let empty = Rect::new(5.0, 5.0, 0.0, 10.0);
    let r = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(overlap_ratio(&empty, &r), 0.0);
}

#[test]
fn best_overlap_empty_is_zero() {
    let c = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(best_overlap(&c, &[]), 0.0);
}

#[test]
fn best_overlap_takes_max() {
    let c = Rect::new(0.0, 0.0, 10.0, 10.0);
    let existing = [Rect::new(5.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 10.0, 9.0), Rect::new(50.0, 50.0, 5.0, 5.0)];
    assert!((best_overlap(&c, &existing) - 0.9).abs() < 1e-12);
}

#[test]
fn duplicate_threshold_is_inclusive() {
    assert!(is_duplicate(0.82, 0.82));
    assert!(is_duplicate(0.9, 0.82));
    assert!(!is_duplicate(0.8199, 0.82));
}

#[test]
fn exact_threshold_overlap_counts_as_duplicate() {
    // 82 of 100 columns covered.
    let candidate = Rect::new(0.0, 0.0, 100.0, 10.0);
    let existing = [Rect::new(18.0, 0.0, 200.0, 10.0)];
    let best = best_overlap(&candidate, &existing);
    assert!((best - 0.82).abs() < 1e-12);
    assert!(is_duplicate(best, 0.82));
}

// =============================================================
// integer rects
// =============================================================

#[test]
fn rounded_to_nearest() {
    let r = Rect::new(10.4, 10.6, 49.5, 50.49).rounded();
    assert_eq!(r, PixelRect::new(10, 11, 50, 50));
}

#[test]
fn rounded_keeps_right_edge() {
    let r = Rect::new(10.5, 0.5, 989.5, 20.0).rounded();
    assert_eq!(r.x + r.w, 1000);
    assert_eq!(r, PixelRect::new(11, 1, 989, 20));
}

#[test]
fn clamped_to_clips_overhang() {
    assert_eq!(PixelRect::new(990, -5, 20, 20).clamped_to(1000, 750), PixelRect::new(990, 0, 10, 15));
    assert_eq!(PixelRect::new(10, 10, 20, 20).clamped_to(1000, 750), PixelRect::new(10, 10, 20, 20));
}

#[test]
fn pixel_rect_fits_within() {
    assert!(PixelRect::new(0, 0, 800, 600).fits_within(800, 600));
    assert!(!PixelRect::new(1, 0, 800, 600).fits_within(800, 600));
    assert!(!PixelRect::new(-1, 0, 10, 10).fits_within(800, 600));
}

#[test]
fn pixel_rect_to_rect() {
    assert_eq!(PixelRect::new(1, 2, 3, 4).to_rect(), Rect::new(1.0, 2.0, 3.0, 4.0));
}
