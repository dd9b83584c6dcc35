//! Whole-store export and import.
//!
//! DESIGN
//! ======
//! The interchange document carries every row plus image bytes encoded by a
//! [`PayloadCodec`]. Import is replace-all: payloads are decoded and each
//! collection is run through the data migration steps before anything is
//! written, then the store is swapped in a single transaction. A bad payload
//! therefore leaves the existing data untouched.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::db::rows::{
    COLLECTION_COLUMNS, CollectionRow, IMAGE_COLUMNS, ImageRow, REGION_COLUMNS, RegionRow,
};
use crate::error::StoreError;
use crate::services::migration::{CollectionSnapshot, upgrade, write_snapshot};
use crate::services::preview::sniff_mime;

#[cfg(test)]
#[path = "transfer_test.rs"]
mod transfer_test;

/// Format version written by [`export_document`].
pub const DOCUMENT_VERSION: u32 = 4;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not a data URL")]
    NotDataUrl,
    #[error("payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl From<PayloadError> for StoreError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e.to_string())
    }
}

/// Encodes image bytes for the interchange document.
pub trait PayloadCodec {
    fn encode(&self, bytes: &[u8]) -> String;

    /// # Errors
    ///
    /// Returns a [`PayloadError`] if `payload` isn't in this codec's format.
    fn decode(&self, payload: &str) -> Result<Vec<u8>, PayloadError>;
}

/// `data:<mime>;base64,<bytes>`, with the MIME type sniffed from the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlCodec;

impl PayloadCodec for DataUrlCodec {
    fn encode(&self, bytes: &[u8]) -> String {
        let mime = sniff_mime(bytes).unwrap_or(FALLBACK_MIME);
        format!("data:{mime};base64,{}", BASE64.encode(bytes))
    }

    fn decode(&self, payload: &str) -> Result<Vec<u8>, PayloadError> {
        let rest = payload.strip_prefix("data:").ok_or(PayloadError::NotDataUrl)?;
        let (_, data) = rest.split_once(";base64,").ok_or(PayloadError::NotDataUrl)?;
        Ok(BASE64.decode(data.trim())?)
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocCollection {
    #[serde(flatten)]
    pub row: CollectionRow,
    /// Inline image of a single-image collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocImage {
    #[serde(flatten)]
    pub row: ImageRow,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterchangeDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub exported_at: String,
    pub collections: Vec<DocCollection>,
    pub images: Vec<DocImage>,
    pub regions: Vec<RegionRow>,
}

impl InterchangeDocument {
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if `json` isn't an interchange document.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns a [`PayloadError`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Counts from an [`import_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub collections: usize,
    pub images: usize,
    pub regions: usize,
    /// Images and regions whose collection wasn't in the document.
    pub dropped: usize,
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Snapshot the whole store.
///
/// # Errors
///
/// Returns a database error if a query fails, or `Payload` if the timestamp
/// can't be formatted.
pub async fn export_document(pool: &SqlitePool, codec: &impl PayloadCodec) -> Result<InterchangeDocument, StoreError> {
    let collections =
        sqlx::query_as::<_, CollectionRow>(&format!("SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY id"))
            .fetch_all(pool)
            .await?;
    let images =
        sqlx::query_as::<_, ImageRow>(&format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY collection_id, idx, id"))
            .fetch_all(pool)
            .await?;
    let regions = sqlx::query_as::<_, RegionRow>(&format!(
        "SELECT {REGION_COLUMNS} FROM regions ORDER BY collection_id, created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    let exported_at = OffsetDateTime::now_utc().format(&Rfc3339).map_err(PayloadError::from)?;
    let doc = InterchangeDocument {
        version: DOCUMENT_VERSION,
        exported_at,
        collections: collections
            .into_iter()
            .map(|row| DocCollection { image_payload: row.image_blob.as_deref().map(|b| codec.encode(b)), row })
            .collect(),
        images: images
            .into_iter()
            .map(|row| DocImage { payload: Some(codec.encode(&row.bytes)), row })
            .collect(),
        regions,
    };
    info!(
        collections = doc.collections.len(),
        images = doc.images.len(),
        regions = doc.regions.len(),
        "store exported"
    );
    Ok(doc)
}

/// Replace the whole store with `doc`.
///
/// # Errors
///
/// Returns `Payload` if any image payload fails to decode (nothing is
/// written in that case), or a database error if the swap fails.
pub async fn import_document(
    pool: &SqlitePool,
    doc: InterchangeDocument,
    codec: &impl PayloadCodec,
) -> Result<ImportReport, StoreError> {
    let snapshots = decode_document(doc, codec)?;
    let mut report = snapshots.report;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM regions").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM images").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM collections").execute(&mut *tx).await?;
    for mut snap in snapshots.collections {
        upgrade(&mut snap);
        report.images += snap.images.len();
        report.regions += snap.regions.len();
        write_snapshot(&mut *tx, &snap).await?;
    }
    tx.commit().await?;

    info!(
        collections = report.collections,
        images = report.images,
        regions = report.regions,
        dropped = report.dropped,
        "store imported"
    );
    Ok(report)
}

struct DecodedDocument {
    collections: Vec<CollectionSnapshot>,
    report: ImportReport,
}

fn decode_document(doc: InterchangeDocument, codec: &impl PayloadCodec) -> Result<DecodedDocument, PayloadError> {
    if doc.version > DOCUMENT_VERSION {
        warn!(version = doc.version, supported = DOCUMENT_VERSION, "importing a newer document version");
    }

    let mut order = Vec::with_capacity(doc.collections.len());
    let mut by_id: HashMap<String, CollectionSnapshot> = HashMap::new();
    for DocCollection { mut row, image_payload } in doc.collections {
        if let Some(payload) = image_payload {
            row.image_blob = Some(codec.decode(&payload)?);
        }
        order.push(row.id.clone());
        by_id.insert(row.id.clone(), CollectionSnapshot { collection: row, ..CollectionSnapshot::default() });
    }

    let mut dropped = 0;
    for DocImage { mut row, payload } in doc.images {
        let Some(snap) = by_id.get_mut(&row.collection_id) else {
            dropped += 1;
            continue;
        };
        if let Some(payload) = payload {
            row.bytes = codec.decode(&payload)?;
        }
        snap.images.push(row);
    }
    for row in doc.regions {
        match by_id.get_mut(&row.collection_id) {
            Some(snap) => snap.regions.push(row),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "rows without a collection skipped on import");
    }

    let collections: Vec<_> = order.iter().filter_map(|id| by_id.remove(id)).collect();
    Ok(DecodedDocument {
        report: ImportReport { collections: collections.len(), dropped, ..ImportReport::default() },
        collections,
    })
}
