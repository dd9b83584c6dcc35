//! Pixel previews: region thumbnails and collection covers.
//!
//! DESIGN
//! ======
//! Decoding and resampling are CPU-bound, so [`PreviewWorker::render`] moves
//! them onto `spawn_blocking`. Each request gets a generation number and the
//! worker remembers the newest one per key until it finishes. A render that
//! finishes after a newer request for the same key is dropped, so the last
//! request always wins.
//!
//! Every decode holds a [`DecodeLease`] from the worker's [`HandleRegistry`].
//! The lease travels into the blocking closure and releases on drop, whatever
//! way the closure exits.
//!
//! ERROR HANDLING
//! ==============
//! Bytes that fail to decode produce a placeholder tile and a `warn!`. Callers
//! never see a decode error.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use canvas::crop::{Focus, place};
use canvas::geometry::PixelRect;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use tracing::{debug, warn};

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

/// Output frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const THUMB: Self = Self { width: 320, height: 240 };
    pub const COVER: Self = Self { width: 480, height: 270 };
}

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([255, 255, 255, 15]);

// =============================================================================
// DECODING
// =============================================================================

/// Width and height of encoded image bytes, read from the header only.
#[must_use]
pub fn probe_dimensions(bytes: &[u8]) -> Option<(i64, i64)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let (w, h) = reader.into_dimensions().ok()?;
    Some((i64::from(w), i64::from(h)))
}

/// MIME type of encoded image bytes, if the format is recognised.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Solid translucent tile returned in place of an undecodable image.
#[must_use]
pub fn placeholder(frame: FrameSize) -> RgbaImage {
    RgbaImage::from_pixel(frame.width.max(1), frame.height.max(1), PLACEHOLDER_FILL)
}

/// Crop `source` to `crop` (or keep it whole), place it in `frame` at `zoom`
/// around `focus`, and resample.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_crop(source: &DynamicImage, crop: Option<PixelRect>, frame: FrameSize, focus: Focus, zoom: f64) -> RgbaImage {
    let (iw, ih) = (i64::from(source.width()), i64::from(source.height()));
    let region = match crop {
        Some(r) => {
            let x = r.x.clamp(0, iw);
            let y = r.y.clamp(0, ih);
            let w = (r.x + r.w).clamp(0, iw) - x;
            let h = (r.y + r.h).clamp(0, ih) - y;
            if w <= 0 || h <= 0 {
                return placeholder(frame);
            }
            source.crop_imm(x as u32, y as u32, w as u32, h as u32)
        }
        None => source.clone(),
    };

    let placement = place(
        f64::from(region.width()),
        f64::from(region.height()),
        f64::from(frame.width),
        f64::from(frame.height),
        zoom,
        focus,
    );
    let window = placement.source_rect();
    let sx = window.x.floor().max(0.0) as u32;
    let sy = window.y.floor().max(0.0) as u32;
    let sw = (window.w.round() as u32).clamp(1, region.width().saturating_sub(sx).max(1));
    let sh = (window.h.round() as u32).clamp(1, region.height().saturating_sub(sy).max(1));

    region
        .crop_imm(sx, sy, sw, sh)
        .resize_exact(frame.width.max(1), frame.height.max(1), FilterType::Triangle)
        .to_rgba8()
}

/// Decode `bytes` and render a preview, falling back to the placeholder.
#[must_use]
pub fn render_preview(bytes: &[u8], request: &PreviewRequest) -> RgbaImage {
    match image::load_from_memory(bytes) {
        Ok(source) => render_crop(&source, request.crop, request.frame, request.focus, request.zoom),
        Err(e) => {
            warn!(key = ?request.key, error = %e, "preview decode failed; using placeholder");
            placeholder(request.frame)
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// What a preview is of. Generations are tracked per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreviewKey {
    Region(String),
    Cover(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub key: PreviewKey,
    /// Source window in image pixels; `None` uses the whole image.
    pub crop: Option<PixelRect>,
    pub frame: FrameSize,
    pub focus: Focus,
    pub zoom: f64,
}

// =============================================================================
// HANDLE REGISTRY
// =============================================================================

/// Counts decodes in flight per key.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    held: Arc<Mutex<HashMap<PreviewKey, usize>>>,
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decode for `key`. The returned lease releases it on drop.
    #[must_use]
    pub fn acquire(&self, key: PreviewKey) -> DecodeLease {
        *lock(&self.held).entry(key.clone()).or_insert(0) += 1;
        DecodeLease { held: Arc::clone(&self.held), key }
    }

    /// Total decodes in flight.
    #[must_use]
    pub fn live(&self) -> usize {
        lock(&self.held).values().sum()
    }

    #[must_use]
    pub fn is_held(&self, key: &PreviewKey) -> bool {
        lock(&self.held).contains_key(key)
    }
}

/// RAII registration of one decode.
#[derive(Debug)]
pub struct DecodeLease {
    held: Arc<Mutex<HashMap<PreviewKey, usize>>>,
    key: PreviewKey,
}

impl Drop for DecodeLease {
    fn drop(&mut self) {
        let mut held = lock(&self.held);
        if let Some(count) = held.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                held.remove(&self.key);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// WORKER
// =============================================================================

/// A request's place in its key's generation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: PreviewKey,
    pub generation: u64,
}

/// Renders previews off the async threads with last-request-wins semantics.
///
/// Generations come from one worker-wide counter, so a key's entry can be
/// dropped once its latest request finishes without a later request reusing
/// an old number.
#[derive(Debug, Default)]
pub struct PreviewWorker {
    registry: HandleRegistry,
    generations: Mutex<Generations>,
}

#[derive(Debug, Default)]
struct Generations {
    next: u64,
    latest: HashMap<PreviewKey, u64>,
}

impl PreviewWorker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Start a request for `key`, superseding any earlier one.
    pub fn begin(&self, key: PreviewKey) -> Ticket {
        let mut generations = lock(&self.generations);
        generations.next += 1;
        let generation = generations.next;
        generations.latest.insert(key.clone(), generation);
        Ticket { key, generation }
    }

    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        lock(&self.generations).latest.get(&ticket.key) == Some(&ticket.generation)
    }

    /// Keys with a request still outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.generations).latest.len()
    }

    /// Hand back `image` if `ticket` is still the latest for its key.
    pub fn finish(&self, ticket: &Ticket, image: RgbaImage) -> Option<RgbaImage> {
        let mut generations = lock(&self.generations);
        if generations.latest.get(&ticket.key) == Some(&ticket.generation) {
            generations.latest.remove(&ticket.key);
            Some(image)
        } else {
            debug!(key = ?ticket.key, generation = ticket.generation, "stale preview dropped");
            None
        }
    }

    /// Render `request` from `bytes`. Returns `None` if a newer request for
    /// the same key began before this one finished.
    pub async fn render(&self, bytes: Vec<u8>, request: PreviewRequest) -> Option<RgbaImage> {
        let ticket = self.begin(request.key.clone());
        let lease = self.registry.acquire(request.key.clone());
        let frame = request.frame;

        let joined = tokio::task::spawn_blocking(move || {
            let _lease = lease;
            render_preview(&bytes, &request)
        })
        .await;

        let image = match joined {
            Ok(image) => image,
            Err(e) => {
                warn!(key = ?ticket.key, error = %e, "preview task failed; using placeholder");
                placeholder(frame)
            }
        };
        self.finish(&ticket, image)
    }
}
