//! Store configuration, loaded from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `sqlite://collection_tracker.db?mode=rwc` |
//! | `DB_MAX_CONNECTIONS` | `1` |
//! | `MIN_REGION_PX` | `12` |
//! | `DEDUP_THRESHOLD` | `0.82` |
//!
//! A `.env` file in the working directory is loaded first when present.

use canvas::consts::DEDUP_OVERLAP_THRESHOLD;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

const DEFAULT_DATABASE_URL: &str = "sqlite://collection_tracker.db?mode=rwc";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 1;
const DEFAULT_MIN_REGION_PX: i64 = 12;

/// Runtime settings for [`crate::Store`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// `SQLx` SQLite connection URL.
    pub database_url: String,
    /// Pool size. Must stay 1 for `sqlite::memory:`, where every connection
    /// is a separate database.
    pub max_connections: u32,
    /// Minimum region width and height in image pixels.
    pub min_region_px: i64,
    /// Best-overlap ratio at or above which a new region is a duplicate.
    pub dedup_threshold: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            min_region_px: DEFAULT_MIN_REGION_PX,
            dedup_threshold: DEDUP_OVERLAP_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// Load from `.env` and the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "failed to load .env"),
        }

        let defaults = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: env_parse("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_region_px: env_parse("MIN_REGION_PX", defaults.min_region_px),
            dedup_threshold: env_parse("DEDUP_THRESHOLD", defaults.dedup_threshold),
        }
        .sanitized()
    }

    /// Private in-memory database; used by tests and throwaway sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { database_url: "sqlite::memory:".to_owned(), ..Self::default() }
    }

    /// Replace out-of-range values with defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.max_connections == 0 {
            warn!("DB_MAX_CONNECTIONS must be at least 1; using default");
            self.max_connections = defaults.max_connections;
        }
        if self.min_region_px < 1 {
            warn!(min_region_px = self.min_region_px, "MIN_REGION_PX must be positive; using default");
            self.min_region_px = defaults.min_region_px;
        }
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            warn!(dedup_threshold = self.dedup_threshold, "DEDUP_THRESHOLD must be in (0, 1]; using default");
            self.dedup_threshold = defaults.dedup_threshold;
        }
        self
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
