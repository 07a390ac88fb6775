use crate::{BlobError, BlobResult};

/// Chunk size used when nothing else is configured (255 KiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 255 * 1024;

/// Configuration for blob stores
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Fixed size of every stored chunk except the last
    pub chunk_size: u64,

    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,

    /// Compute a SHA-256 of the payload while ingesting
    pub compute_checksum: bool,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_blob_bytes: 5 * 1024 * 1024 * 1024, // 5GB
            compute_checksum: true,
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Skip checksum computation
    pub fn without_checksum(mut self) -> Self {
        self.compute_checksum = false;
        self
    }

    /// Effective ingest limit for one request
    pub fn limit_for(&self, requested: Option<u64>) -> u64 {
        requested.map_or(self.max_blob_bytes, |r| r.min(self.max_blob_bytes))
    }

    pub(crate) fn validate(&self) -> BlobResult<()> {
        if self.chunk_size == 0 {
            return Err(BlobError::invalid("chunk_size must be greater than zero"));
        }
        if usize::try_from(self.chunk_size).is_err() {
            return Err(BlobError::invalid("chunk_size does not fit in memory"));
        }
        Ok(())
    }
}
