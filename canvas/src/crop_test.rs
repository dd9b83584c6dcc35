#![allow(clippy::float_cmp)]

use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn cover_fit_overflows_one_axis() {
    // 200x100 into 100x100: scale 1, 100px horizontal overflow.
    let p = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::default());
    assert_eq!(p.scale, 1.0);
    assert_eq!(p.overflow_x, 100.0);
    assert_eq!(p.overflow_y, 0.0);
    assert_eq!(p.offset_x, 50.0);
    assert_eq!(p.offset_y, 0.0);
}

#[test]
fn focus_pans_within_overflow() {
    let left = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::new(0.0, 50.0));
    let right = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::new(100.0, 50.0));
    assert_eq!(left.offset_x, 0.0);
    assert_eq!(right.offset_x, 100.0);
}

#[test]
fn focus_is_centered_on_axis_without_overflow() {
    let p = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::new(10.0, 90.0));
    assert_eq!(p.focus.x, 10.0);
    assert_eq!(p.focus.y, 50.0);
}

#[test]
fn zoom_below_one_is_raised() {
    let a = place(200.0, 100.0, 100.0, 100.0, 0.3, Focus::default());
    let b = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::default());
    assert_eq!(a, b);
}

#[test]
fn zoom_adds_overflow_on_both_axes() {
    let p = place(100.0, 100.0, 100.0, 100.0, 2.0, Focus::default());
    assert_eq!(p.scale, 2.0);
    assert_eq!(p.overflow_x, 100.0);
    assert_eq!(p.overflow_y, 100.0);
    assert_eq!(p.offset_x, 50.0);
    assert_eq!(p.offset_y, 50.0);
}

#[test]
fn out_of_range_focus_is_clamped() {
    let p = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::new(150.0, -20.0));
    assert_eq!(p.focus.x, 100.0);
    assert_eq!(p.offset_x, 100.0);
}

#[test]
fn degenerate_sizes_do_not_divide_by_zero() {
    let p = place(0.0, 100.0, 100.0, 100.0, 1.0, Focus::new(10.0, 10.0));
    assert_eq!(p.overflow_x, 0.0);
    assert_eq!(p.focus, Focus::default());
    assert!(p.scale.is_finite());
}

#[test]
fn source_rect_maps_back_to_image() {
    // Zoom 2 on a square: visible window is the central half.
    let p = place(100.0, 100.0, 100.0, 100.0, 2.0, Focus::default());
    let src = p.source_rect();
    assert!(approx(src.x, 25.0));
    assert!(approx(src.y, 25.0));
    assert!(approx(src.w, 50.0));
    assert!(approx(src.h, 50.0));
}

#[test]
fn drag_right_moves_focus_left() {
    let p = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::default());
    let f = p.focus_after_drag(25.0, 40.0);
    assert!(approx(f.x, 25.0));
    assert_eq!(f.y, 50.0);
}

#[test]
fn drag_clamps_focus() {
    let p = place(200.0, 100.0, 100.0, 100.0, 1.0, Focus::default());
    assert_eq!(p.focus_after_drag(-1000.0, 0.0).x, 100.0);
}

#[test]
fn zoom_helpers_clamp() {
    assert_eq!(clamp_zoom(0.5), 1.0);
    assert_eq!(clamp_zoom(5.0), 3.0);
    assert_eq!(clamp_zoom(f64::NAN), 1.0);
    assert!(approx(zoom_step(1.0, 0.25), 1.25));
    assert_eq!(zoom_step(2.9, 0.5), 3.0);
}

#[test]
fn nan_focus_recenters() {
    assert_eq!(Focus::new(f64::NAN, 30.0).clamped(), Focus::new(50.0, 30.0));
}
