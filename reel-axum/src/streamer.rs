//! HTTP byte-range streaming on top of a [`BlobStore`].

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reel_blob::{BlobId, BlobObject, BlobStore, ByteStream, ResolvedRange};
use tracing::{debug, error, instrument};

use crate::content_type::resolve_content_type;
use crate::range::{content_range, RangeRequest};
use crate::ReelAxumError;

/// Stored objects never change, so they may be cached forever.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Characters left alone by `encodeURIComponent`
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// What the client asked for, taken from the request
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub range: Option<String>,
    pub if_none_match: Option<String>,
    pub fallback_type: &'static str,
    pub attachment: bool,
    /// HEAD: headers only, the store is never read
    pub head_only: bool,
}

impl StreamRequest {
    pub fn new(fallback_type: &'static str) -> Self {
        Self {
            range: None,
            if_none_match: None,
            fallback_type,
            attachment: false,
            head_only: false,
        }
    }

    /// Pull `Range` and `If-None-Match` out of request headers
    pub fn from_headers(headers: &HeaderMap, fallback_type: &'static str) -> Self {
        let text = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            range: text(header::RANGE),
            if_none_match: text(header::IF_NONE_MATCH),
            ..Self::new(fallback_type)
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn with_attachment(mut self, attachment: bool) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn head_only(mut self, head_only: bool) -> Self {
        self.head_only = head_only;
        self
    }
}

/// Status, headers and an optional lazily-read body
pub struct RangeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<ByteStream>,
}

impl std::fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

impl IntoResponse for RangeResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(stream) => Body::from_stream(stream),
            None => Body::empty(),
        };
        let mut res = Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

/// Answers whole-object and single-range reads
#[derive(Clone)]
pub struct RangeStreamer {
    store: Arc<dyn BlobStore>,
}

impl RangeStreamer {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Resolve metadata, then the range, then open the body stream.
    ///
    /// Nothing is read from the store until headers are decided, and only
    /// the chunks covering the selected range are read at all.
    #[instrument(skip(self, id, request), fields(id = %id, range = ?request.range))]
    pub async fn handle(
        &self,
        id: &BlobId,
        request: &StreamRequest,
    ) -> Result<RangeResponse, ReelAxumError> {
        let object = self.store.stat(id).await?;
        let total = object.length;
        let mut headers = base_headers(&object, request)?;

        let Some(raw) = request.range.as_deref() else {
            if not_modified(&object, request.if_none_match.as_deref()) {
                debug!("etag matched");
                return Ok(RangeResponse {
                    status: StatusCode::NOT_MODIFIED,
                    headers,
                    body: None,
                });
            }

            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(total));
            let body = match ResolvedRange::full(total) {
                Some(range) if !request.head_only => Some(self.open(id, range).await?),
                _ => None,
            };
            return Ok(RangeResponse {
                status: StatusCode::OK,
                headers,
                body,
            });
        };

        let range = RangeRequest::parse(raw)
            .and_then(|r| r.resolve(total))
            .ok_or(ReelAxumError::RangeNotSatisfiable { total })?;

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.content_length()));
        headers.insert(header::CONTENT_RANGE, header_value(&content_range(&range))?);

        let body = if request.head_only {
            None
        } else {
            Some(self.open(id, range).await?)
        };

        Ok(RangeResponse {
            status: StatusCode::PARTIAL_CONTENT,
            headers,
            body,
        })
    }

    async fn open(&self, id: &BlobId, range: ResolvedRange) -> Result<ByteStream, ReelAxumError> {
        let stream = self.store.read_range(id, range.start, range.end).await?;
        Ok(monitored(stream, id.clone(), range))
    }
}

fn base_headers(object: &BlobObject, request: &StreamRequest) -> Result<HeaderMap, ReelAxumError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CONTENT_TYPE,
        header_value(&resolve_content_type(object, request.fallback_type))?,
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_IMMUTABLE));
    headers.insert(header::LAST_MODIFIED, header_value(&http_date(object))?);
    if let Some(etag) = object.etag() {
        headers.insert(header::ETAG, header_value(&etag)?);
    }
    if request.attachment {
        headers.insert(header::CONTENT_DISPOSITION, header_value(&attachment(object))?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, ReelAxumError> {
    HeaderValue::from_str(value)
        .map_err(|_| ReelAxumError::bad_request(format!("Invalid header value: {value}")))
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
fn http_date(object: &BlobObject) -> String {
    object
        .created_at
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn attachment(object: &BlobObject) -> String {
    let name = object.filename.as_deref().unwrap_or(object.id.as_str());
    format!(
        "attachment; filename=\"{}\"",
        utf8_percent_encode(name, FILENAME_ENCODE_SET)
    )
}

fn not_modified(object: &BlobObject, if_none_match: Option<&str>) -> bool {
    let (Some(etag), Some(candidates)) = (object.etag(), if_none_match) else {
        return false;
    };
    candidates.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
    })
}

/// Logs transfers that end early. Headers are already on the wire by the
/// time the body is polled, so a failure here can only be reported by
/// cutting the body short.
fn monitored(inner: ByteStream, id: BlobId, range: ResolvedRange) -> ByteStream {
    let expected = range.content_length();
    let stream = async_stream::stream! {
        let mut guard = TransferGuard { id, range, sent: 0, done: false };
        let mut inner = inner;

        while let Some(item) = inner.next().await {
            match item {
                Ok(bytes) => {
                    guard.sent += bytes.len() as u64;
                    yield Ok(bytes);
                }
                Err(e) => {
                    error!(
                        id = %guard.id,
                        start = guard.range.start,
                        end = guard.range.end,
                        sent = guard.sent,
                        error = %e,
                        "blob stream failed mid-response"
                    );
                    guard.done = true;
                    yield Err(e);
                    return;
                }
            }
        }

        guard.done = true;
        if guard.sent != expected {
            error!(
                id = %guard.id,
                start = guard.range.start,
                end = guard.range.end,
                sent = guard.sent,
                expected,
                "blob stream ended short"
            );
            yield Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "blob stream ended short",
            ));
        }
    };
    Box::pin(stream)
}

struct TransferGuard {
    id: BlobId,
    range: ResolvedRange,
    sent: u64,
    done: bool,
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        if !self.done {
            debug!(
                id = %self.id,
                start = self.range.start,
                end = self.range.end,
                sent = self.sent,
                "client went away mid-stream"
            );
        }
    }
}
