//! reel-axum: HTTP surface for the blob store.
//!
//! Serves stored objects with single-range `Range` support on two entry
//! points (`/files/{id}` and `/stream/video/{id}`) and accepts admin
//! uploads at `/admin/uploads`.

pub mod app;
pub mod content_type;
pub mod range;
pub mod routes;
pub mod state;
pub mod streamer;
pub mod upload;
pub mod urls;
mod error;

pub use app::{blob_routes, ReelApp};
pub use error::ReelAxumError;
pub use range::RangeRequest;
pub use state::{BlobAppState, UploadLimits};
pub use streamer::{RangeResponse, RangeStreamer, StreamRequest};
pub use upload::UploadReceipt;
pub use urls::BlobUrls;
