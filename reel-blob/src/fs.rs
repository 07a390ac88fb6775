use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::chunk::{ChunkWindow, Chunker};
use crate::{
    BlobConfig, BlobError, BlobId, BlobObject, BlobPut, BlobResult, BlobStore, ByteStream,
    ResolvedRange,
};

const OBJECTS_DIR: &str = "objects";
const STAGING_DIR: &str = "staging";
const META_FILE: &str = "meta.json";

/// Filesystem store: one directory per object holding `meta.json` and
/// fixed-size `chunk-NNNNNNNN` files.
///
/// ```text
/// root/
///   objects/<id>/meta.json
///   objects/<id>/chunk-00000000
///   staging/<id>/...            ingests in flight
/// ```
///
/// An ingest writes into `staging/<id>` and becomes visible through a single
/// directory rename into `objects/` once every chunk and the metadata are
/// synced to disk.
pub struct FsBlobStore {
    root: PathBuf,
    config: BlobConfig,
}

impl FsBlobStore {
    /// Create the directory layout and sweep staging leftovers from
    /// ingests that never finished (crash, kill -9).
    pub async fn open(root: impl Into<PathBuf>, config: BlobConfig) -> BlobResult<Self> {
        config.validate()?;
        let store = Self {
            root: root.into(),
            config,
        };

        fs::create_dir_all(store.root.join(OBJECTS_DIR))
            .await
            .map_err(BlobError::storage)?;
        fs::create_dir_all(store.root.join(STAGING_DIR))
            .await
            .map_err(BlobError::storage)?;

        let swept = store.sweep_staging().await?;
        info!(
            root = %store.root.display(),
            chunk_size = store.config.chunk_size,
            swept,
            "filesystem blob store opened"
        );
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_dir(&self, id: &BlobId) -> PathBuf {
        self.root.join(OBJECTS_DIR).join(id.as_str())
    }

    fn staging_dir(&self, name: &str) -> PathBuf {
        self.root.join(STAGING_DIR).join(name)
    }

    async fn sweep_staging(&self) -> BlobResult<usize> {
        let mut entries = fs::read_dir(self.root.join(STAGING_DIR))
            .await
            .map_err(BlobError::storage)?;

        let mut swept = 0;
        while let Some(entry) = entries.next_entry().await.map_err(BlobError::storage)? {
            let path = entry.path();
            match fs::remove_dir_all(&path).await {
                Ok(()) => swept += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to sweep staging entry"),
            }
        }
        Ok(swept)
    }

    async fn write_staged(
        &self,
        staging: &Path,
        id: BlobId,
        put: BlobPut,
        mut body: ByteStream,
    ) -> BlobResult<BlobObject> {
        let mut chunker = Chunker::new(
            self.config.chunk_size,
            self.config.limit_for(put.max_bytes),
            self.config.compute_checksum,
        );
        let mut index = 0u64;

        while let Some(part) = body.next().await {
            let part = part.map_err(|e| BlobError::ingest_failed(e.to_string()))?;
            for chunk in chunker.push(part)? {
                write_synced(&chunk_path(staging, index), &chunk).await?;
                index += 1;
            }
        }

        let payload = chunker.finish();
        if let Some(tail) = payload.tail {
            write_synced(&chunk_path(staging, index), &tail).await?;
            index += 1;
        }

        let mut object = BlobObject::new(id, put.kind, payload.length, self.config.chunk_size);
        object.filename = put.filename;
        object.content_type = put.content_type;
        object.checksum = payload.checksum;

        write_synced(&staging.join(META_FILE), &serde_json::to_vec_pretty(&object)?).await?;

        fs::rename(staging, self.object_dir(&object.id))
            .await
            .map_err(BlobError::storage)?;
        sync_dir(&self.root.join(OBJECTS_DIR)).await?;

        info!(id = %object.id, length = object.length, chunks = index, "blob ingested");
        Ok(object)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self, put, body), fields(kind = %put.kind, filename = ?put.filename))]
    async fn ingest(&self, put: BlobPut, body: ByteStream) -> BlobResult<BlobObject> {
        let id = BlobId::new();
        let staging = self.staging_dir(id.as_str());
        fs::create_dir_all(&staging)
            .await
            .map_err(BlobError::storage)?;

        match self.write_staged(&staging, id, put, body).await {
            Ok(object) => Ok(object),
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging).await {
                    warn!(path = %staging.display(), error = %cleanup, "failed to discard partial ingest");
                }
                warn!(error = %e, "ingest aborted");
                Err(e)
            }
        }
    }

    async fn stat(&self, id: &BlobId) -> BlobResult<BlobObject> {
        match fs::read(self.object_dir(id).join(META_FILE)).await {
            Ok(raw) => {
                let object: BlobObject = serde_json::from_slice(&raw)?;
                if object.chunk_size == 0 {
                    return Err(BlobError::Serialization {
                        source: serde::de::Error::custom("chunkSize must be greater than zero"),
                    });
                }
                Ok(object)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::not_found(id.as_str()))
            }
            Err(e) => Err(BlobError::storage(e)),
        }
    }

    async fn read_range(
        &self,
        id: &BlobId,
        start: u64,
        end_inclusive: u64,
    ) -> BlobResult<ByteStream> {
        let object = self.stat(id).await?;
        let range = ResolvedRange::clamp(start, end_inclusive, object.length)?;
        let window = ChunkWindow::new(object.chunk_size, &range);
        debug!(id = %id, start = range.start, end = range.end, "filesystem range read");

        let stream: ByteStream = Box::pin(chunk_stream(self.object_dir(id), window));
        Ok(stream)
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        // Unpublish first so the id is gone before the chunks are.
        let tombstone = self.staging_dir(&format!("{id}.deleted"));
        match fs::rename(self.object_dir(id), &tombstone).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::not_found(id.as_str()))
            }
            Err(e) => return Err(BlobError::storage(e)),
        }
        fs::remove_dir_all(&tombstone)
            .await
            .map_err(BlobError::storage)?;
        info!(id = %id, "blob deleted");
        Ok(())
    }

    fn chunk_size(&self) -> u64 {
        self.config.chunk_size
    }
}

fn chunk_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("chunk-{index:08}"))
}

async fn write_synced(path: &Path, data: &[u8]) -> BlobResult<()> {
    let mut file = fs::File::create(path).await.map_err(BlobError::storage)?;
    file.write_all(data).await.map_err(BlobError::storage)?;
    file.sync_all().await.map_err(BlobError::storage)?;
    Ok(())
}

/// Persist a rename: the directory entry lives in the parent, not the file.
async fn sync_dir(dir: &Path) -> BlobResult<()> {
    let handle = fs::File::open(dir).await.map_err(BlobError::storage)?;
    handle.sync_all().await.map_err(BlobError::storage)?;
    Ok(())
}

/// One chunk file open at a time, read only as far as the window needs.
fn chunk_stream(dir: PathBuf, window: ChunkWindow) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    async_stream::try_stream! {
        for index in window.chunks() {
            let (offset, len) = window.span(index);
            let mut file = fs::File::open(chunk_path(&dir, index)).await?;
            if offset > 0 {
                file.seek(SeekFrom::Start(offset)).await?;
            }
            let mut buf = vec![0u8; len as usize];
            file.read_exact(&mut buf).await?;
            yield Bytes::from(buf);
        }
    }
}
