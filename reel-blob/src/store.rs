use async_trait::async_trait;

use crate::{BlobId, BlobObject, BlobPut, BlobResult, ByteStream};

/// Core blob storage operations - must be implemented by all storage backends.
///
/// Objects are immutable once ingested. Implementations publish an id only
/// after the payload and its metadata are durable, so `stat` and
/// `read_range` never observe a partial object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `body` as a sequence of fixed-size chunks under a new id.
    ///
    /// On any failure the partial chunks are discarded and no id is exposed.
    async fn ingest(&self, put: BlobPut, body: ByteStream) -> BlobResult<BlobObject>;

    /// Metadata without touching payload bytes
    async fn stat(&self, id: &BlobId) -> BlobResult<BlobObject>;

    /// Lazily stream exactly the bytes `[start, end_inclusive]`.
    ///
    /// `end_inclusive` is clamped to the last byte. `start` past the end or
    /// after `end_inclusive` is `RangeNotSatisfiable`. Only chunks
    /// overlapping the window are read, one at a time, as the consumer polls.
    async fn read_range(
        &self,
        id: &BlobId,
        start: u64,
        end_inclusive: u64,
    ) -> BlobResult<ByteStream>;

    /// Remove an object; the id resolves to `NotFound` afterwards
    async fn delete(&self, id: &BlobId) -> BlobResult<()>;

    /// Chunk size used for new objects
    fn chunk_size(&self) -> u64;
}
