use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::str::FromStr;
use uuid::Uuid;

use crate::{BlobError, BlobResult};

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Unique identifier for a blob.
///
/// Always the canonical hyphenated lowercase UUID form, so it is safe to
/// use as a path component or a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(String);

impl BlobId {
    /// Generate a new random blob ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate and normalize an externally supplied id
    pub fn parse(raw: &str) -> BlobResult<Self> {
        Uuid::parse_str(raw.trim())
            .map(|uuid| Self(uuid.hyphenated().to_string()))
            .map_err(|_| BlobError::invalid_id(raw))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlobId {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlobId {
    type Error = BlobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

/// Advisory tag for operational bookkeeping. Has no effect on reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    #[default]
    Poster,
    Video,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKind::Poster => "poster",
            BlobKind::Video => "video",
        }
    }

    /// `video/*` uploads are videos, everything else is treated as a poster.
    pub fn infer_from_mime(mime: Option<&str>) -> Self {
        match mime {
            Some(m) if m.trim().to_ascii_lowercase().starts_with("video/") => BlobKind::Video,
            _ => BlobKind::Poster,
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlobKind {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poster" => Ok(BlobKind::Poster),
            "video" => Ok(BlobKind::Video),
            other => Err(BlobError::invalid(format!("Unknown blob kind: {other}"))),
        }
    }
}

/// Request to ingest a blob
#[derive(Debug, Clone, Default)]
pub struct BlobPut {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub kind: BlobKind,
    /// Abort the ingest once the source produces more than this many bytes
    pub max_bytes: Option<u64>,
}

impl BlobPut {
    pub fn new(kind: BlobKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// An inclusive, already validated byte window into a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    /// Clamp `end` to the last byte and reject empty or out-of-bounds windows.
    pub fn clamp(start: u64, end: u64, total_size: u64) -> BlobResult<Self> {
        if total_size == 0 || start >= total_size || start > end {
            return Err(BlobError::RangeNotSatisfiable {
                start,
                end,
                length: total_size,
            });
        }
        Ok(Self {
            start,
            end: end.min(total_size - 1),
            total_size,
        })
    }

    /// The whole object, or `None` for an empty one.
    pub fn full(total_size: u64) -> Option<Self> {
        Self::clamp(0, total_size.saturating_sub(1), total_size).ok()
    }

    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }
}
