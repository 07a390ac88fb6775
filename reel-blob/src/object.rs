use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlobId, BlobKind};

/// Finalized metadata for a stored blob.
///
/// A `BlobObject` only exists once every byte of the payload is durably
/// written; stores never hand out a record for an ingest in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub id: BlobId,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub length: u64,
    pub created_at: DateTime<Utc>,
    pub kind: BlobKind,
    /// Chunk size the payload was written with
    pub chunk_size: u64,
    /// Lowercase hex SHA-256 of the payload
    pub checksum: Option<String>,
}

impl BlobObject {
    pub fn new(id: BlobId, kind: BlobKind, length: u64, chunk_size: u64) -> Self {
        Self {
            id,
            filename: None,
            content_type: None,
            length,
            created_at: Utc::now(),
            kind,
            chunk_size,
            checksum: None,
        }
    }

    /// Strong entity tag derived from the checksum
    pub fn etag(&self) -> Option<String> {
        self.checksum.as_ref().map(|sum| format!("\"{sum}\""))
    }
}
