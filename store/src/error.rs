//! Store error type.
//!
//! Validation rejections (too-small or duplicate regions, out-of-bounds
//! rectangles) are not errors: they surface as `Ok(None)` from the operation
//! that was refused. Everything here is a real failure the caller must see.

/// Errors returned by [`crate::Store`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("schema migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("invalid payload: {0}")]
    Payload(String),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound { entity, id: id.to_owned() }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
            Self::Migrate(_) => "E_MIGRATE",
            Self::Payload(_) => "E_PAYLOAD",
        }
    }
}
