use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reel_blob::BlobError;
use reel_core::errors::{ErrorKind, ReelError};
use thiserror::Error;

use crate::range::unsatisfied_content_range;

/// Errors surfaced by the HTTP layer. This is the only place error kinds
/// become status codes.
#[derive(Debug, Error)]
pub enum ReelAxumError {
    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("Requested range not satisfiable for {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    #[error("Upload exceeds the limit of {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("{0}")]
    BadRequest(String),
}

impl ReelAxumError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// The client-facing error, before sanitization
    pub fn to_reel_error(&self) -> ReelError {
        match self {
            Self::Blob(e) => match e {
                BlobError::NotFound { .. } => ReelError::not_found("Blob not found"),
                BlobError::InvalidId { id } => {
                    ReelError::bad_request(format!("Invalid blob id: {id}"))
                }
                BlobError::RangeNotSatisfiable { .. } => {
                    ReelError::range_not_satisfiable("Requested range not satisfiable")
                }
                BlobError::TooLarge { limit } => too_large(*limit),
                BlobError::Invalid { message } => ReelError::bad_request(message.clone()),
                BlobError::IngestFailed { reason } => {
                    ReelError::bad_request(format!("Upload interrupted: {reason}"))
                }
                BlobError::StorageUnavailable { .. }
                | BlobError::Io { .. }
                | BlobError::Serialization { .. } => ReelError::general_error(e.to_string()),
            },
            Self::RangeNotSatisfiable { .. } => {
                ReelError::range_not_satisfiable("Requested range not satisfiable")
            }
            Self::UploadTooLarge { limit } => too_large(*limit),
            Self::BadRequest(msg) => ReelError::bad_request(msg.clone()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.to_reel_error().kind
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The store itself failed, as opposed to a bad or unknown request
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Blob(e) if e.is_storage_failure())
    }

    fn unsatisfied_total(&self) -> Option<u64> {
        match self {
            Self::RangeNotSatisfiable { total } => Some(*total),
            Self::Blob(BlobError::RangeNotSatisfiable { length, .. }) => Some(*length),
            _ => None,
        }
    }
}

fn too_large(limit: u64) -> ReelError {
    ReelError::payload_too_large(format!("Upload exceeds the limit of {limit} bytes"))
        .with_data(serde_json::json!({ "limit": limit }))
}

impl IntoResponse for ReelAxumError {
    fn into_response(self) -> Response {
        // 416 carries the object length and nothing else
        if let Some(total) = self.unsatisfied_total() {
            let mut res = StatusCode::RANGE_NOT_SATISFIABLE.into_response();
            let headers = res.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&unsatisfied_content_range(total)) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            return res;
        }

        let safe = self.to_reel_error().sanitize_for_client();
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
