//! Database initialization and schema migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`crate::Store::open`] uses this module to create the `SQLite` pool and
//! bring the schema to the current layout before any data migration step or
//! query runs. Schema files live in `src/db/migrations` and are embedded at
//! compile time.

pub mod rows;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Open the pool and run pending schema migrations.
///
/// The pool never recycles idle connections, since closing the last
/// connection to `sqlite::memory:` drops the database.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the connection fails, or a schema
/// migration fails.
pub async fn init_pool(config: &StoreConfig) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!(url = %config.database_url, "database ready");

    Ok(pool)
}
