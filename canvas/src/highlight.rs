//! Hover, selection and timed focus emphasis for regions.
//!
//! Hover and selection are event-driven and persist until changed. Focus is a
//! short pulse ("show me this card") that expires on its own, so it must be
//! re-evaluated every animation frame while active: the host calls
//! [`HighlightController::tick`] from its frame callback and keeps requesting
//! frames while it returns true. Focus layers over hover and selection without
//! modifying them.

#[cfg(test)]
#[path = "highlight_test.rs"]
mod highlight_test;

use std::f64::consts::PI;

use crate::consts::{FOCUS_DURATION_SECS, PULSE_AMPLITUDE, PULSE_BASE};
use crate::doc::RegionId;

/// An active focus pulse on one region. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusPulse {
    pub region_id: RegionId,
    pub start: f64,
    pub until: f64,
}

impl FocusPulse {
    /// Fraction of the pulse elapsed at `now`, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now: f64) -> f64 {
        let span = self.until - self.start;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / span).clamp(0.0, 1.0)
    }

    /// Line-width multiplier at `now`: `0.9 + sin(progress·π)·0.5`.
    #[must_use]
    pub fn line_factor(&self, now: f64) -> f64 {
        PULSE_BASE + (self.progress(now) * PI).sin() * PULSE_AMPLITUDE
    }

    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.until
    }
}

/// Emphasis to draw a region with, strongest layer first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emphasis {
    /// Plain outline.
    None,
    /// The pointer is over the region (or its list entry).
    Hovered,
    /// The region was clicked.
    Selected,
    /// The region is pulsing; `line_factor` scales the emphasis line width.
    Focused { line_factor: f64 },
}

/// Tracks hover, selection and at most one focus pulse.
#[derive(Debug, Clone)]
pub struct HighlightController {
    focus: Option<FocusPulse>,
    hover: Option<RegionId>,
    selected: Option<RegionId>,
    duration: f64,
}

impl Default for HighlightController {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightController {
    #[must_use]
    pub fn new() -> Self {
        Self::with_duration(FOCUS_DURATION_SECS)
    }

    /// Controller whose focus pulses last `duration` seconds.
    #[must_use]
    pub fn with_duration(duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 { duration } else { FOCUS_DURATION_SECS };
        Self { focus: None, hover: None, selected: None, duration }
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Start pulsing `region_id` at `now`, replacing any pulse in progress.
    pub fn focus(&mut self, region_id: RegionId, now: f64) {
        self.focus = Some(FocusPulse { region_id, start: now, until: now + self.duration });
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// The pulse still running at `now`, if any.
    #[must_use]
    pub fn focused(&self, now: f64) -> Option<&FocusPulse> {
        self.focus.as_ref().filter(|f| !f.is_expired(now))
    }

    /// Set the hovered region. Returns true if it changed.
    pub fn set_hover(&mut self, region_id: Option<RegionId>) -> bool {
        if self.hover == region_id {
            return false;
        }
        self.hover = region_id;
        true
    }

    /// Set the selected region. Returns true if it changed.
    pub fn select(&mut self, region_id: Option<RegionId>) -> bool {
        if self.selected == region_id {
            return false;
        }
        self.selected = region_id;
        true
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hover.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether a pulse is pending and frames must keep coming.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.focus.is_some()
    }

    /// Advance to `now`. Clears an expired pulse.
    ///
    /// Returns true when the caller must draw another frame: while a pulse
    /// runs, and once more on the frame where it expires.
    pub fn tick(&mut self, now: f64) -> bool {
        match &self.focus {
            None => false,
            Some(f) if f.is_expired(now) => {
                self.focus = None;
                true
            }
            Some(_) => true,
        }
    }

    /// Drop every reference to a region that no longer exists.
    pub fn forget(&mut self, region_id: &str) {
        if self.hover.as_deref() == Some(region_id) {
            self.hover = None;
        }
        if self.selected.as_deref() == Some(region_id) {
            self.selected = None;
        }
        if self.focus.as_ref().is_some_and(|f| f.region_id == region_id) {
            self.focus = None;
        }
    }

    /// Emphasis for `region_id` at `now`: focus, then selection, then hover.
    #[must_use]
    pub fn emphasis(&self, region_id: &str, now: f64) -> Emphasis {
        if let Some(f) = self.focused(now) {
            if f.region_id == region_id {
                return Emphasis::Focused { line_factor: f.line_factor(now) };
            }
        }
        if self.selected.as_deref() == Some(region_id) {
            return Emphasis::Selected;
        }
        if self.hover.as_deref() == Some(region_id) {
            return Emphasis::Hovered;
        }
        Emphasis::None
    }
}
