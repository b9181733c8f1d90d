// Licensed under the Apache-2.0 license

use crate::checksum::ChecksumAccumulator;

/// State of one image transfer. Created by
/// [`StagingArea::begin_transfer`](crate::StagingArea::begin_transfer) and
/// passed into every chunk write, so independent transfers never share a
/// checksum.
///
/// Chunks are expected in non-decreasing offset order. This is not enforced:
/// a chunk below the high-water mark is folded into the chain like any other.
#[derive(Debug, Default, Clone)]
pub struct TransferSession {
    checksum: ChecksumAccumulator,
    chunks: usize,
    bytes: usize,
    high_water: usize,
}

impl TransferSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checksum of everything read back from flash so far, or `None` before
    /// the first chunk.
    pub fn query_checksum(&self) -> Option<u16> {
        self.checksum.query()
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes
    }

    /// One past the highest image offset written so far.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Returns true if a chunk at `offset` would go backwards.
    pub(crate) fn is_out_of_order(&self, offset: usize) -> bool {
        self.chunks > 0 && offset < self.high_water
    }

    /// Working copy of the checksum for a chunk that is still being verified.
    pub(crate) fn checksum(&self) -> ChecksumAccumulator {
        self.checksum
    }

    /// Commit a fully verified chunk.
    pub(crate) fn commit(&mut self, checksum: ChecksumAccumulator, offset: usize, len: usize) {
        self.checksum = checksum;
        self.chunks += 1;
        self.bytes += len;
        self.high_water = self.high_water.max(offset + len);
    }
}
