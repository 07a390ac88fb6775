use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    #[error("Invalid blob id: {id}")]
    InvalidId { id: String },

    #[error("Range {start}-{end} not satisfiable for blob of {length} bytes")]
    RangeNotSatisfiable { start: u64, end: u64, length: u64 },

    #[error("Blob exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Ingest source failed: {reason}")]
    IngestFailed { reason: String },

    #[error("Storage unavailable: {source}")]
    StorageUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Metadata serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    /// Wrap a backend failure as storage unavailable
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageUnavailable {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid id error
    pub fn invalid_id<S: Into<String>>(id: S) -> Self {
        Self::InvalidId { id: id.into() }
    }

    /// The byte source handed to `ingest` failed
    pub fn ingest_failed<S: Into<String>>(reason: S) -> Self {
        Self::IngestFailed {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Backend-side failures: the medium could not be read or written.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable { .. } | Self::Io { .. } | Self::Serialization { .. }
        )
    }
}
