use super::*;

#[test]
fn idle_by_default() {
    let state = SelectionState::default();
    assert_eq!(state, SelectionState::Idle);
    assert!(!state.is_dragging());
    assert!(state.live_rect().is_none());
}

#[test]
fn live_rect_normalizes_backwards_drag() {
    let state = SelectionState::Dragging {
        pointer_id: 1,
        start: Point::new(200.0, 180.0),
        current: Point::new(100.0, 100.0),
    };
    assert!(state.is_dragging());
    assert_eq!(state.live_rect(), Some(Rect::new(100.0, 100.0, 100.0, 80.0)));
}

#[test]
fn outcomes_compare_by_payload() {
    assert_eq!(
        SelectionOutcome::Committed(PixelRect::new(1, 2, 3, 4)),
        SelectionOutcome::Committed(PixelRect::new(1, 2, 3, 4))
    );
    assert_ne!(SelectionOutcome::Selected("a".to_owned()), SelectionOutcome::Selected("b".to_owned()));
    assert_ne!(SelectionOutcome::Rejected, SelectionOutcome::Duplicate);
}
