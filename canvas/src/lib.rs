//! Region annotation engine for the collection tracker.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but
//! everything except [`render`] and the [`engine::Engine`] wrapper is plain
//! math and state that also builds and tests natively. It owns the
//! interactive half of the tracker: turning pointer events on a displayed
//! image into region commits, mapping between canvas and image pixel space,
//! cover-fit crops for thumbnails, and the focus pulse timing. Persisting
//! the resulting [`engine::Action`]s is the host's job.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Per-surface selection machines and the testable [`engine::EngineCore`] |
//! | [`doc`] | In-memory region document mirrored from the store |
//! | [`geometry`] | Rectangle normalization, intersection and overlap |
//! | [`camera`] | Contain-fit mapping between canvas and image space |
//! | [`crop`] | Cover-fit crop placement for thumbnails and covers |
//! | [`input`] | Pointer event types and the selection state machine states |
//! | [`hit`] | Hit-testing a point against regions |
//! | [`highlight`] | Hover/selection emphasis and the timed focus pulse |
//! | [`render`] | Drawing a surface to a 2D context |
//! | [`consts`] | Shared numeric constants (thresholds, durations, styling sizes) |

pub mod camera;
pub mod consts;
pub mod crop;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod highlight;
pub mod hit;
pub mod input;
pub mod render;
