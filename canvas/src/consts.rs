//! Shared numeric constants for the canvas crate.

// ── Selection ───────────────────────────────────────────────────

/// Minimum width and height of a drag rectangle, in device pixels, for it to
/// count as a region rather than a click.
pub const MIN_SELECTION_PX: f64 = 12.0;

/// A candidate whose best overlap with an existing region reaches this ratio
/// is treated as a duplicate and dropped.
pub const DEDUP_OVERLAP_THRESHOLD: f64 = 0.82;

// ── Focus pulse ─────────────────────────────────────────────────

/// How long a focused region pulses, in seconds.
pub const FOCUS_DURATION_SECS: f64 = 1.2;

/// Resting line-width factor of the focus pulse.
pub const PULSE_BASE: f64 = 0.9;

/// Peak added line-width factor at the middle of the pulse.
pub const PULSE_AMPLITUDE: f64 = 0.5;

// ── Crop / zoom ─────────────────────────────────────────────────

/// Neutral focal point on either axis, in percent.
pub const FOCUS_CENTER: f64 = 50.0;

/// Lowest zoom factor; 1.0 is a plain cover fit.
pub const MIN_ZOOM: f64 = 1.0;

/// Highest zoom factor accepted for thumbnails and covers.
pub const MAX_ZOOM: f64 = 3.0;

// ── Styling (CSS pixels, scaled by DPR at draw time) ────────────

/// Corner radius of region outlines.
pub const REGION_CORNER_RADIUS_PX: f64 = 10.0;

/// Outline width of an idle region.
pub const REGION_LINE_PX: f64 = 1.6;

/// Outline width of a hovered or selected region.
pub const REGION_EMPHASIS_LINE_PX: f64 = 2.6;

/// Outline width of the live drag preview.
pub const PREVIEW_LINE_PX: f64 = 2.0;

/// Dash and gap lengths of the live drag preview.
pub const PREVIEW_DASH_PX: [f64; 2] = [8.0, 6.0];
