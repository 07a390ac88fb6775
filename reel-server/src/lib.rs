pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use reel_axum::{BlobAppState, BlobUrls, ReelApp, UploadLimits};
use reel_blob::{BlobConfig, BlobStore, FsBlobStore, MemoryBlobStore};
use tracing::info;

pub use config::{ServerSettings, StorageBackend};

pub async fn open_store(settings: &ServerSettings) -> Result<Arc<dyn BlobStore>> {
    let mut blob_config = BlobConfig::new().with_chunk_size(settings.chunk_size);
    if !settings.checksum {
        blob_config = blob_config.without_checksum();
    }

    let store: Arc<dyn BlobStore> = match settings.backend {
        StorageBackend::Fs => Arc::new(
            FsBlobStore::open(&settings.root, blob_config)
                .await
                .with_context(|| format!("opening blob store at {}", settings.root.display()))?,
        ),
        StorageBackend::Memory => Arc::new(MemoryBlobStore::with_config(blob_config)?),
    };
    Ok(store)
}

pub async fn build(settings: &ServerSettings) -> Result<ReelApp> {
    let store = open_store(settings).await?;
    info!(
        backend = ?settings.backend,
        chunk_size = settings.chunk_size,
        max_upload_mb = settings.max_upload_mb,
        "blob store ready"
    );

    let state = BlobAppState::new(store)
        .with_limits(UploadLimits::from_megabytes(settings.max_upload_mb))
        .with_urls(BlobUrls::new(settings.public_prefix.clone()));

    Ok(ReelApp::new(state))
}
