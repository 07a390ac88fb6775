//! # reel-blob: chunked blob storage with lazy range reads
//!
//! `reel-blob` stores posters and videos as immutable objects split into
//! fixed-size chunks, and hands back pull-based byte streams for any
//! inclusive byte range so an HTTP layer can serve `206 Partial Content`
//! without buffering whole files.
//!
//! ## Quick Start
//!
//! ```rust
//! use reel_blob::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryBlobStore::new();
//!
//! let body: ByteStream = Box::pin(futures_util::stream::once(async {
//!     Ok::<_, std::io::Error>(Bytes::from_static(b"Hello, world!"))
//! }));
//! let object = store
//!     .ingest(BlobPut::new(BlobKind::Poster).with_filename("hello.txt"), body)
//!     .await?;
//!
//! // Bytes 7..=11 -> "world"
//! let window = store.read_range(&object.id, 7, 11).await?;
//! # drop(window);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  RangeStreamer  │  ← HTTP framing (reel-axum)
//! ├─────────────────┤
//! │   BlobStore     │  ← ingest / stat / read_range
//! ├─────────────────┤
//! │ Memory │  Fs    │  ← chunk storage
//! └─────────────────┘
//! ```

pub mod chunk;
mod config;
mod error;
pub mod fs;
pub mod memory;
mod object;
pub mod store;
mod types;

pub use chunk::ChunkWindow;
pub use config::{BlobConfig, DEFAULT_CHUNK_SIZE};
pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use object::BlobObject;
pub use store::BlobStore;
pub use types::{BlobId, BlobKind, BlobPut, ByteStream, ResolvedRange};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobConfig, BlobError, BlobId, BlobKind, BlobObject, BlobPut, BlobResult, BlobStore,
        ByteStream, FsBlobStore, MemoryBlobStore,
    };
}
