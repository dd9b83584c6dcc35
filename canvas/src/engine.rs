use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, ImageSize, Point};
use crate::consts::{DEDUP_OVERLAP_THRESHOLD, MIN_SELECTION_PX};
use crate::doc::{ImageId, RegionDoc, RegionId, RegionView};
use crate::geometry::{PixelRect, best_overlap, is_duplicate, normalize};
use crate::highlight::HighlightController;
use crate::hit::hit_test;
use crate::input::{Button, PointerId, SelectionOutcome, SelectionState};
use crate::render;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Persist a new region; the host calls the store and then [`EngineCore::apply_create`].
    CreateRegion { image_id: ImageId, rect: PixelRect },
    /// A region was clicked.
    RegionSelected { id: RegionId },
    /// The region under the pointer changed.
    HoverChanged { id: Option<RegionId> },
    /// Another image surface became the one receiving new regions.
    ActiveImageChanged { image_id: ImageId },
    RenderNeeded,
}

/// Thresholds applied when a drag ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Minimum drag width and height in device-pixel canvas units.
    pub min_size_px: f64,
    /// Best-overlap ratio at or above which a drag counts as a duplicate.
    pub dedup_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { min_size_px: MIN_SELECTION_PX, dedup_threshold: DEDUP_OVERLAP_THRESHOLD }
    }
}

/// One displayed image and its independent selection machine.
#[derive(Debug, Clone)]
pub struct Surface {
    pub image_id: ImageId,
    pub camera: Camera,
    /// Top-left corner of the canvas in client (CSS) coordinates.
    pub origin: Point,
    pub selection: SelectionState,
}

impl Surface {
    #[must_use]
    pub fn new(image_id: ImageId) -> Self {
        Self { image_id, camera: Camera::default(), origin: Point::default(), selection: SelectionState::Idle }
    }

    fn to_canvas(&self, client: Point) -> Point {
        self.camera.client_to_canvas(client, self.origin)
    }
}

/// Core engine state: everything that doesn't touch a browser element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub doc: RegionDoc,
    pub surfaces: HashMap<ImageId, Surface>,
    pub active: Option<ImageId>,
    pub highlight: HighlightController,
    pub config: SelectionConfig,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: SelectionConfig) -> Self {
        Self { config, ..Self::default() }
    }

    // --- Data inputs ---

    /// Hydrate the document from a store snapshot.
    pub fn load_snapshot(&mut self, regions: Vec<RegionView>) {
        self.doc.load_snapshot(regions);
    }

    /// Hydrate the document from a JSON array of regions.
    ///
    /// # Errors
    ///
    /// Returns the parse error; the current document is kept.
    pub fn load_snapshot_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.doc.load_snapshot_json(json)
    }

    /// Apply a committed region from the store.
    pub fn apply_create(&mut self, region: RegionView) {
        self.doc.insert(region);
    }

    /// Apply a status change committed by the store.
    pub fn apply_status(&mut self, id: &str, found_trade: bool, received: bool) -> bool {
        self.doc.set_status(id, found_trade, received)
    }

    /// Apply a region deletion committed by the store.
    pub fn apply_delete(&mut self, id: &str) {
        self.doc.remove(id);
        self.highlight.forget(id);
    }

    /// Drop an image surface and every region drawn on it.
    pub fn remove_image(&mut self, image_id: &str) {
        for region in self.doc.for_image(image_id).into_iter().map(|r| r.id.clone()).collect::<Vec<_>>() {
            self.highlight.forget(&region);
        }
        self.doc.remove_image(image_id);
        self.surfaces.remove(image_id);
        if self.active.as_deref() == Some(image_id) {
            self.active = None;
        }
    }

    // --- Surfaces ---

    /// Create or update the surface for `image_id`.
    ///
    /// `image` is `None` until the image decodes (or when it fails to), which
    /// disables drags on that surface. A drag in progress survives a resize.
    pub fn set_surface(
        &mut self,
        image_id: &str,
        image: Option<ImageSize>,
        origin: Point,
        css_w: f64,
        css_h: f64,
        dpr: f64,
    ) -> &Surface {
        let surface = self
            .surfaces
            .entry(image_id.to_owned())
            .or_insert_with(|| Surface::new(image_id.to_owned()));
        surface.camera = Camera::from_css(css_w, css_h, dpr, image);
        surface.origin = origin;
        surface
    }

    /// Make `image_id` the surface that receives new regions.
    /// Returns true if the active surface changed.
    pub fn set_active(&mut self, image_id: &str) -> bool {
        if self.active.as_deref() == Some(image_id) || !self.surfaces.contains_key(image_id) {
            return false;
        }
        self.active = Some(image_id.to_owned());
        true
    }

    // --- Pointer input ---

    /// Pointer pressed on the surface for `image_id`. `client` is in CSS pixels.
    pub fn on_pointer_down(&mut self, image_id: &str, pointer_id: PointerId, client: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let Some(surface) = self.surfaces.get_mut(image_id) else {
            return Vec::new();
        };
        if surface.selection.is_dragging() {
            return Vec::new();
        }
        let canvas = surface.to_canvas(client);
        if !surface.camera.contains(canvas) {
            return Vec::new();
        }
        surface.selection = SelectionState::Dragging { pointer_id, start: canvas, current: canvas };

        let mut actions = Vec::new();
        if self.set_active(image_id) {
            actions.push(Action::ActiveImageChanged { image_id: image_id.to_owned() });
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Pointer moved over the surface. Extends a drag, or tracks hover when idle.
    pub fn on_pointer_move(&mut self, image_id: &str, pointer_id: PointerId, client: Point) -> Vec<Action> {
        let Some(surface) = self.surfaces.get_mut(image_id) else {
            return Vec::new();
        };
        let canvas = surface.to_canvas(client);

        if let SelectionState::Dragging { pointer_id: owner, current, .. } = &mut surface.selection {
            if *owner != pointer_id {
                return Vec::new();
            }
            *current = canvas;
            return vec![Action::RenderNeeded];
        }

        let hovered = hit_test(&self.doc, image_id, &surface.camera, canvas).map(|h| h.region_id);
        self.set_hover(hovered)
    }

    /// Pointer released. Ends the drag owned by `pointer_id`, if any.
    pub fn on_pointer_up(&mut self, image_id: &str, pointer_id: PointerId, client: Point) -> Vec<Action> {
        let Some(surface) = self.surfaces.get_mut(image_id) else {
            return Vec::new();
        };
        let SelectionState::Dragging { pointer_id: owner, start, .. } = surface.selection else {
            return Vec::new();
        };
        if owner != pointer_id {
            return Vec::new();
        }
        let end = surface.to_canvas(client);
        surface.selection = SelectionState::Idle;

        let outcome = resolve_drag(&self.doc, surface, &self.config, start, end);
        self.actions_for(image_id, outcome)
    }

    /// Pointer capture lost or the pointer was cancelled: abandon the drag.
    pub fn on_pointer_cancel(&mut self, image_id: &str, pointer_id: PointerId) -> Vec<Action> {
        let Some(surface) = self.surfaces.get_mut(image_id) else {
            return Vec::new();
        };
        match surface.selection {
            SelectionState::Dragging { pointer_id: owner, .. } if owner == pointer_id => {
                surface.selection = SelectionState::Idle;
                self.actions_for(image_id, SelectionOutcome::Cancelled)
            }
            _ => Vec::new(),
        }
    }

    fn actions_for(&mut self, image_id: &str, outcome: SelectionOutcome) -> Vec<Action> {
        match outcome {
            SelectionOutcome::Committed(rect) => {
                vec![Action::CreateRegion { image_id: image_id.to_owned(), rect }, Action::RenderNeeded]
            }
            SelectionOutcome::Selected(id) => {
                self.highlight.select(Some(id.clone()));
                vec![Action::RegionSelected { id }, Action::RenderNeeded]
            }
            SelectionOutcome::Rejected | SelectionOutcome::Duplicate | SelectionOutcome::Cancelled => {
                vec![Action::RenderNeeded]
            }
        }
    }

    // --- Highlight ---

    /// Set hover from outside the canvas (e.g. the region list).
    pub fn set_hover(&mut self, id: Option<RegionId>) -> Vec<Action> {
        if self.highlight.set_hover(id.clone()) {
            vec![Action::HoverChanged { id }, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Select a region from outside the canvas.
    pub fn select(&mut self, id: Option<RegionId>) -> Vec<Action> {
        if self.highlight.select(id) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Pulse a region, switching to its image surface first if needed.
    pub fn focus_region(&mut self, id: &str, now: f64) -> Vec<Action> {
        let Some(image_id) = self.doc.get(id).map(|r| r.image_id.clone()) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        if self.set_active(&image_id) {
            actions.push(Action::ActiveImageChanged { image_id });
        }
        self.highlight.focus(id.to_owned(), now);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Advance the focus pulse. Call every animation frame while
    /// [`HighlightController::is_animating`] is true.
    pub fn tick(&mut self, now: f64) -> Vec<Action> {
        if self.highlight.tick(now) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Queries ---

    #[must_use]
    pub fn active_image(&self) -> Option<&str> {
        self.active.as_deref()
    }

    #[must_use]
    pub fn surface(&self, image_id: &str) -> Option<&Surface> {
        self.surfaces.get(image_id)
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.highlight.selected()
    }

    #[must_use]
    pub fn region(&self, id: &str) -> Option<&RegionView> {
        self.doc.get(id)
    }
}

/// Decide how a drag from `start` to `end` (canvas space) ends on `surface`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn resolve_drag(
    doc: &RegionDoc,
    surface: &Surface,
    config: &SelectionConfig,
    start: Point,
    end: Point,
) -> SelectionOutcome {
    let display = normalize(start.x, start.y, end.x, end.y);
    if !display.is_valid(config.min_size_px) {
        return match hit_test(doc, &surface.image_id, &surface.camera, end) {
            Some(hit) => SelectionOutcome::Selected(hit.region_id),
            None => SelectionOutcome::Rejected,
        };
    }

    let image_rect = surface.camera.rect_to_image_space(&display);
    let existing = doc.rects_for_image(&surface.image_id);
    if is_duplicate(best_overlap(&image_rect, &existing), config.dedup_threshold) {
        return SelectionOutcome::Duplicate;
    }
    let mut committed = image_rect.rounded();
    if let Some(img) = surface.camera.drawable_image() {
        committed = committed.clamped_to(img.width.round() as i64, img.height.round() as i64);
    }
    SelectionOutcome::Committed(committed)
}

/// Browser elements backing one surface.
struct SurfaceElements {
    canvas: HtmlCanvasElement,
    image: Option<HtmlImageElement>,
}

/// The full canvas engine. Wraps `EngineCore` and owns the canvas elements.
pub struct Engine {
    elements: HashMap<ImageId, SurfaceElements>,
    pub core: EngineCore,
}

impl Engine {
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self { elements: HashMap::new(), core: EngineCore::with_config(config) }
    }

    /// Bind a canvas element to the surface for `image_id`.
    pub fn attach_surface(&mut self, image_id: &str, canvas: HtmlCanvasElement) {
        self.elements.insert(image_id.to_owned(), SurfaceElements { canvas, image: None });
    }

    /// Unbind and forget the surface for `image_id`.
    pub fn detach_surface(&mut self, image_id: &str) {
        self.elements.remove(image_id);
        self.core.remove_image(image_id);
    }

    /// Set the decoded image for a surface (or `None` after a decode failure).
    pub fn set_image(&mut self, image_id: &str, image: Option<HtmlImageElement>) {
        if let Some(el) = self.elements.get_mut(image_id) {
            el.image = image;
        }
    }

    /// Update viewport geometry for a surface and resize its backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, image_id: &str, origin: Point, css_w: f64, css_h: f64, dpr: f64) {
        let Some(el) = self.elements.get(image_id) else {
            return;
        };
        let size = el
            .image
            .as_ref()
            .filter(|img| img.natural_width() > 0 && img.natural_height() > 0)
            .map(|img| ImageSize::new(f64::from(img.natural_width()), f64::from(img.natural_height())));
        let surface = self.core.set_surface(image_id, size, origin, css_w, css_h, dpr);
        el.canvas.set_width(surface.camera.canvas_w.max(0.0) as u32);
        el.canvas.set_height(surface.camera.canvas_h.max(0.0) as u32);
    }

    // --- Delegated input ---

    pub fn on_pointer_down(&mut self, image_id: &str, pointer_id: PointerId, client: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_down(image_id, pointer_id, client, button)
    }

    pub fn on_pointer_move(&mut self, image_id: &str, pointer_id: PointerId, client: Point) -> Vec<Action> {
        self.core.on_pointer_move(image_id, pointer_id, client)
    }

    pub fn on_pointer_up(&mut self, image_id: &str, pointer_id: PointerId, client: Point) -> Vec<Action> {
        self.core.on_pointer_up(image_id, pointer_id, client)
    }

    pub fn on_pointer_cancel(&mut self, image_id: &str, pointer_id: PointerId) -> Vec<Action> {
        self.core.on_pointer_cancel(image_id, pointer_id)
    }

    pub fn tick(&mut self, now: f64) -> Vec<Action> {
        self.core.tick(now)
    }

    // --- Render ---

    /// Draw one surface at time `now` (seconds).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context can't be obtained or a draw call fails.
    pub fn render(&self, image_id: &str, now: f64) -> Result<(), JsValue> {
        let (Some(el), Some(surface)) = (self.elements.get(image_id), self.core.surface(image_id)) else {
            return Ok(());
        };
        let Some(ctx) = el.canvas.get_context("2d")? else {
            return Err(JsValue::from_str("2d context unavailable"));
        };
        let ctx: CanvasRenderingContext2d = ctx.dyn_into()?;
        render::draw_surface(&ctx, surface, el.image.as_ref(), &self.core.doc, &self.core.highlight, now)
    }

    /// Draw every attached surface.
    ///
    /// # Errors
    ///
    /// Returns the first draw error encountered.
    pub fn render_all(&self, now: f64) -> Result<(), JsValue> {
        for image_id in self.elements.keys() {
            self.render(image_id, now)?;
        }
        Ok(())
    }
}
