// Licensed under the Apache-2.0 license

use crate::update_sm::States;
use dfu_config::boot::SlotError;
use dfu_hil::{FlashDrvError, PartitionId};
use thiserror::Error;

/// Errors reported by the staging pipeline. Every failure stops the current
/// operation and is returned to the caller; nothing is retried internally.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DfuError {
    /// The requested range does not fit the staging partition.
    #[error("range {offset:#x}+{len:#x} exceeds the staging partition ({capacity:#x} bytes)")]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("partition {0:?} is not in the partition table")]
    PartitionUnavailable(PartitionId),
    #[error("chunk at {0:#x} has no payload")]
    EmptyChunk(usize),
    #[error("flash write failed at {addr:#x}: {code}")]
    FlashWrite { addr: usize, code: FlashDrvError },
    #[error("flash read-back failed at {addr:#x}: {code}")]
    FlashRead { addr: usize, code: FlashDrvError },
    #[error("flash erase of {len:#x} bytes at {addr:#x} failed: {code}")]
    FlashErase {
        addr: usize,
        len: usize,
        code: FlashDrvError,
    },
    #[error("secure region toggle failed: {code}")]
    SecureToggle { code: FlashDrvError },
    /// `actual` is `None` when no chunk was written in the session.
    #[error("image checksum mismatch: expected {expected:#06x}, staged {actual:?}")]
    ChecksumMismatch { expected: u16, actual: Option<u16> },
    #[error("operation not permitted in update state {0:?}")]
    InvalidState(States),
    #[error("image slot selection failed: {0:?}")]
    Slot(SlotError),
}

impl From<SlotError> for DfuError {
    fn from(err: SlotError) -> Self {
        DfuError::Slot(err)
    }
}
