use std::sync::Arc;

use reel_blob::BlobStore;

use crate::streamer::RangeStreamer;
use crate::urls::BlobUrls;

/// Default upload cap in megabytes
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 200;

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: u64,
}

impl UploadLimits {
    pub fn from_megabytes(mb: u64) -> Self {
        Self {
            max_bytes: mb.saturating_mul(1024 * 1024),
        }
    }

    /// Request body cap: the file plus room for multipart framing and
    /// the small text fields.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_bytes.saturating_add(64 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_MAX_UPLOAD_MB)
    }
}

/// Shared state handed to every route
#[derive(Clone)]
pub struct BlobAppState {
    pub store: Arc<dyn BlobStore>,
    pub streamer: RangeStreamer,
    pub limits: UploadLimits,
    pub urls: BlobUrls,
}

impl BlobAppState {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            streamer: RangeStreamer::new(Arc::clone(&store)),
            store,
            limits: UploadLimits::default(),
            urls: BlobUrls::default(),
        }
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_urls(mut self, urls: BlobUrls) -> Self {
        self.urls = urls;
        self
    }
}
