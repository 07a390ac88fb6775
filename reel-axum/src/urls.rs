use reel_blob::{BlobId, BlobKind, BlobObject};

/// Public URLs for stored objects, optionally behind a path prefix such
/// as `/api` when a proxy mounts the service below the site root.
#[derive(Debug, Clone, Default)]
pub struct BlobUrls {
    prefix: String,
}

impl BlobUrls {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn file(&self, id: &BlobId) -> String {
        format!("{}/files/{id}", self.prefix)
    }

    pub fn video(&self, id: &BlobId) -> String {
        format!("{}/stream/video/{id}", self.prefix)
    }

    /// Videos go through the streaming entry point, everything else is a file.
    pub fn for_object(&self, object: &BlobObject) -> String {
        match object.kind {
            BlobKind::Video => self.video(&object.id),
            BlobKind::Poster => self.file(&object.id),
        }
    }
}
