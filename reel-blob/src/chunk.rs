//! Chunk arithmetic shared by every backend.
//!
//! Writes: [`Chunker`] re-slices an arbitrary sequence of byte buffers into
//! fixed-size chunks while counting and hashing the payload.
//!
//! Reads: [`ChunkWindow`] maps an inclusive byte range onto chunk indices and
//! the in-chunk span to keep from each of them.

use bytes::{Bytes, BytesMut};
use sha2::{Digest, Sha256};
use std::ops::RangeInclusive;

use crate::{BlobError, BlobResult, ResolvedRange};

/// The chunks touched by an inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    chunk_size: u64,
    first_chunk: u64,
    last_chunk: u64,
    /// Bytes to skip at the front of the first chunk
    head_skip: u64,
    /// Bytes to keep from the front of the last chunk
    tail_keep: u64,
}

impl ChunkWindow {
    pub fn new(chunk_size: u64, range: &ResolvedRange) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            chunk_size,
            first_chunk: range.start / chunk_size,
            last_chunk: range.end / chunk_size,
            head_skip: range.start % chunk_size,
            tail_keep: range.end % chunk_size + 1,
        }
    }

    /// Chunk indices to read, in order
    pub fn chunks(&self) -> RangeInclusive<u64> {
        self.first_chunk..=self.last_chunk
    }

    /// `(offset, len)` of the bytes to keep from chunk `index`
    pub fn span(&self, index: u64) -> (u64, u64) {
        let from = if index == self.first_chunk { self.head_skip } else { 0 };
        let to = if index == self.last_chunk {
            self.tail_keep
        } else {
            self.chunk_size
        };
        (from, to - from)
    }
}

/// Outcome of a completed [`Chunker`]
#[derive(Debug)]
pub(crate) struct ChunkedPayload {
    /// Final partial chunk, if the payload did not end on a boundary
    pub tail: Option<Bytes>,
    pub length: u64,
    pub checksum: Option<String>,
}

/// Splits incoming buffers into `chunk_size` pieces.
pub(crate) struct Chunker {
    chunk_size: usize,
    limit: u64,
    pending: BytesMut,
    length: u64,
    hasher: Option<Sha256>,
}

impl Chunker {
    pub fn new(chunk_size: u64, limit: u64, checksum: bool) -> Self {
        let chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        Self {
            chunk_size,
            limit,
            pending: BytesMut::new(),
            length: 0,
            hasher: checksum.then(Sha256::new),
        }
    }

    /// Feed one buffer, returning every chunk it completed.
    pub fn push(&mut self, mut data: Bytes) -> BlobResult<Vec<Bytes>> {
        self.length += data.len() as u64;
        if self.length > self.limit {
            return Err(BlobError::TooLarge { limit: self.limit });
        }
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&data);
        }

        let mut full = Vec::new();
        while !data.is_empty() {
            if self.pending.is_empty() && data.len() >= self.chunk_size {
                full.push(data.split_to(self.chunk_size));
                continue;
            }
            let take = (self.chunk_size - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data.split_to(take));
            if self.pending.len() == self.chunk_size {
                full.push(self.pending.split().freeze());
            }
        }
        Ok(full)
    }

    pub fn finish(self) -> ChunkedPayload {
        ChunkedPayload {
            tail: (!self.pending.is_empty()).then(|| self.pending.freeze()),
            length: self.length,
            checksum: self.hasher.map(|h| hex::encode(h.finalize())),
        }
    }
}
