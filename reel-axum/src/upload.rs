//! Admin upload entry point: `multipart/form-data` with a `file` part and
//! an optional `kind` text part.

use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use reel_blob::{BlobKind, BlobObject, BlobPut, ByteStream};
use serde::Serialize;
use tracing::{info, warn};

use crate::state::BlobAppState;
use crate::ReelAxumError;

/// What the uploader gets back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub id: String,
    pub kind: BlobKind,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub length: u64,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl UploadReceipt {
    pub fn new(object: &BlobObject, url: String) -> Self {
        Self {
            id: object.id.to_string(),
            kind: object.kind,
            filename: object.filename.clone(),
            content_type: object.content_type.clone(),
            length: object.length,
            created_at: object.created_at,
            url,
        }
    }
}

struct FilePart {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

pub async fn upload(
    State(state): State<BlobAppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadReceipt>), ReelAxumError> {
    let limit = state.limits.max_bytes;

    // Refuse obviously oversized bodies before reading any of them
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len as u128 > state.limits.body_limit() as u128) {
        warn!(declared, limit, "upload rejected by declared length");
        return Err(ReelAxumError::UploadTooLarge { limit });
    }

    let mut multipart = multipart.map_err(|e| ReelAxumError::bad_request(e.body_text()))?;
    let mut kind: Option<BlobKind> = None;
    let mut file: Option<FilePart> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("kind") => {
                let raw = field.text().await.map_err(|e| multipart_error(e, limit))?;
                if !raw.trim().is_empty() {
                    kind = Some(raw.parse()?);
                }
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let mut data = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
                    if (data.len() + chunk.len()) as u64 > limit {
                        warn!(?filename, limit, "upload exceeded the size limit");
                        return Err(ReelAxumError::UploadTooLarge { limit });
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some(FilePart {
                    filename,
                    content_type,
                    data: data.freeze(),
                });
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ReelAxumError::bad_request("Missing file field"))?;
    let kind = kind.unwrap_or_else(|| BlobKind::infer_from_mime(file.content_type.as_deref()));

    let mut put = BlobPut::new(kind).with_max_bytes(limit);
    if let Some(name) = file.filename {
        put = put.with_filename(name);
    }
    if let Some(content_type) = file.content_type {
        put = put.with_content_type(content_type);
    }

    let body: ByteStream = Box::pin(futures::stream::once(async move {
        Ok::<_, std::io::Error>(file.data)
    }));
    let object = state.store.ingest(put, body).await?;

    let url = state.urls.for_object(&object);
    info!(id = %object.id, kind = %object.kind, length = object.length, %url, "upload stored");
    Ok((StatusCode::CREATED, Json(UploadReceipt::new(&object, url))))
}

fn multipart_error(e: MultipartError, limit: u64) -> ReelAxumError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ReelAxumError::UploadTooLarge { limit }
    } else {
        ReelAxumError::bad_request(e.body_text())
    }
}
