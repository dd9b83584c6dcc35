//! Persistence for the collection tracker.
//!
//! Collections own images, images own regions. Everything lives in one
//! `SQLite` database accessed through `sqlx`; [`Store`] is the entry point and
//! the modules under [`services`] hold the queries and rules per entity.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | The [`Store`] facade |
//! | [`services`] | Collection, image and region rules; data migration; previews; interchange |
//! | [`model`] | Records, patches and progress math |
//! | [`db`] | Pool setup, schema migrations and raw rows |
//! | [`config`] | Environment-driven settings |
//! | [`clock`] | Monotonic millisecond timestamps |
//! | [`telemetry`] | `tracing` subscriber setup |
//! | [`error`] | [`StoreError`] |

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::StoreConfig;
pub use error::StoreError;
pub use store::Store;

// =============================================================================
// TEST HELPERS
// =============================================================================
