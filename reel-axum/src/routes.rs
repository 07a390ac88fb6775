use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
};
use reel_blob::BlobId;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::content_type::{OCTET_STREAM, VIDEO_MP4};
use crate::state::BlobAppState;
use crate::streamer::{RangeResponse, StreamRequest};
use crate::ReelAxumError;

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    /// Any value other than `0`/`false` asks for a download
    pub dl: Option<String>,
}

impl FileQuery {
    pub fn wants_download(&self) -> bool {
        self.dl
            .as_deref()
            .is_some_and(|v| !matches!(v.trim(), "0" | "false"))
    }
}

/// `GET|HEAD /files/{id}`: always the whole object, `Range` is ignored
pub async fn get_file(
    State(state): State<BlobAppState>,
    Path(id): Path<String>,
    Query(query): Query<FileQuery>,
    method: Method,
    headers: HeaderMap,
) -> Result<RangeResponse, ReelAxumError> {
    let mut request = StreamRequest::from_headers(&headers, OCTET_STREAM)
        .with_attachment(query.wants_download())
        .head_only(method == Method::HEAD);
    // Whole objects only; seeking goes through the video entry point
    request.range = None;
    serve(&state, &id, request).await
}

/// `GET|HEAD /stream/video/{id}`
pub async fn stream_video(
    State(state): State<BlobAppState>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<RangeResponse, ReelAxumError> {
    let request = StreamRequest::from_headers(&headers, VIDEO_MP4).head_only(method == Method::HEAD);
    serve(&state, &id, request).await
}

pub async fn health() -> &'static str {
    "ok"
}

async fn serve(
    state: &BlobAppState,
    raw_id: &str,
    request: StreamRequest,
) -> Result<RangeResponse, ReelAxumError> {
    let result = match BlobId::parse(raw_id) {
        Ok(id) => state.streamer.handle(&id, &request).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = &result {
        let range = request.range.as_deref().unwrap_or("-");
        if e.is_storage_failure() {
            error!(id = raw_id, range, error = %e, "blob request failed");
        } else if e.status() == StatusCode::NOT_FOUND {
            info!(id = raw_id, range, "blob not found");
        } else {
            warn!(id = raw_id, range, error = %e, "blob request rejected");
        }
    }
    result
}
