use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::chunk::{ChunkWindow, Chunker};
use crate::{
    BlobConfig, BlobError, BlobId, BlobObject, BlobPut, BlobResult, BlobStore, ByteStream,
    ResolvedRange,
};

struct StoredBlob {
    object: BlobObject,
    chunks: Arc<Vec<Bytes>>,
}

/// In-memory store for tests and development
pub struct MemoryBlobStore {
    /// Finalized objects only; ingests in flight live on the ingesting task
    objects: Arc<RwLock<HashMap<BlobId, StoredBlob>>>,
    config: BlobConfig,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            config: BlobConfig::default(),
        }
    }

    pub fn with_config(config: BlobConfig) -> BlobResult<Self> {
        config.validate()?;
        Ok(Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            config,
        })
    }

    /// Number of finalized objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[instrument(skip(self, put, body), fields(kind = %put.kind))]
    async fn ingest(&self, put: BlobPut, mut body: ByteStream) -> BlobResult<BlobObject> {
        let mut chunker = Chunker::new(
            self.config.chunk_size,
            self.config.limit_for(put.max_bytes),
            self.config.compute_checksum,
        );
        let mut chunks = Vec::new();

        while let Some(part) = body.next().await {
            let part = part.map_err(|e| BlobError::ingest_failed(e.to_string()))?;
            chunks.extend(chunker.push(part)?);
        }

        let payload = chunker.finish();
        chunks.extend(payload.tail);

        let mut object = BlobObject::new(BlobId::new(), put.kind, payload.length, self.config.chunk_size);
        object.filename = put.filename;
        object.content_type = put.content_type;
        object.checksum = payload.checksum;

        info!(id = %object.id, length = object.length, chunks = chunks.len(), "blob ingested");

        self.objects.write().insert(
            object.id.clone(),
            StoredBlob {
                object: object.clone(),
                chunks: Arc::new(chunks),
            },
        );
        Ok(object)
    }

    async fn stat(&self, id: &BlobId) -> BlobResult<BlobObject> {
        self.objects
            .read()
            .get(id)
            .map(|stored| stored.object.clone())
            .ok_or_else(|| BlobError::not_found(id.as_str()))
    }

    async fn read_range(
        &self,
        id: &BlobId,
        start: u64,
        end_inclusive: u64,
    ) -> BlobResult<ByteStream> {
        let (object, chunks) = {
            let objects = self.objects.read();
            let stored = objects
                .get(id)
                .ok_or_else(|| BlobError::not_found(id.as_str()))?;
            (stored.object.clone(), Arc::clone(&stored.chunks))
        };

        let range = ResolvedRange::clamp(start, end_inclusive, object.length)?;
        let window = ChunkWindow::new(object.chunk_size, &range);
        debug!(id = %id, start = range.start, end = range.end, "memory range read");

        let stream = async_stream::stream! {
            for index in window.chunks() {
                let (offset, len) = window.span(index);
                match chunks.get(index as usize) {
                    Some(chunk) => yield Ok(chunk.slice(offset as usize..(offset + len) as usize)),
                    None => {
                        yield Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            format!("chunk {} missing", index),
                        ));
                        return;
                    }
                }
            }
        };
        let stream: ByteStream = Box::pin(stream);
        Ok(stream)
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        self.objects
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(id.as_str()))
    }

    fn chunk_size(&self) -> u64 {
        self.config.chunk_size
    }
}
