//! Input model: pointer buttons, pointer ids, and the selection state machine.
//!
//! `SelectionState` is the gesture being tracked on one image surface between
//! pointer-down and pointer-up. Positions inside it are already converted to
//! device-pixel canvas coordinates; client/CSS coordinates never reach it.
//! `SelectionOutcome` is how a gesture ended, before the engine turns it into
//! host-facing actions.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::RegionId;
use crate::geometry::{PixelRect, Rect, normalize};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button, pen contact, or single-finger touch.
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Browser-assigned pointer identifier, stable for one contact.
pub type PointerId = i32;

/// Per-surface selection state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging out a new rectangle.
    Dragging {
        /// Pointer that owns the drag; other pointers are ignored until it ends.
        pointer_id: PointerId,
        /// Canvas-space corner where the drag started.
        start: Point,
        /// Canvas-space position of the latest pointer event.
        current: Point,
    },
}

impl SelectionState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// The live drag rectangle in canvas space, if dragging.
    #[must_use]
    pub fn live_rect(&self) -> Option<Rect> {
        match self {
            Self::Idle => None,
            Self::Dragging { start, current, .. } => Some(normalize(start.x, start.y, current.x, current.y)),
        }
    }
}

/// How a drag finished.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// A valid, non-duplicate rectangle ready to persist, in image pixels.
    Committed(PixelRect),
    /// Too small to be a region and not on top of one; nothing happens.
    Rejected,
    /// Too small to be a region but released on an existing region: a click.
    Selected(RegionId),
    /// A valid rectangle that nearly repeats an existing region.
    Duplicate,
    /// Pointer capture was lost mid-drag.
    Cancelled,
}
