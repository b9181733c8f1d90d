// Licensed under the Apache-2.0 license

//! Generic interface for partition-addressed flash storage access.

use crate::partition::{PartitionId, PartitionInfo};
use core::fmt;
use core::result::Result;

/// Partition-relative access to flash storage. It is expected that the platform
/// flash driver (or an emulation of it) implements this trait.
///
/// All offsets are relative to the start of the partition named by `id`. The
/// driver owns the partition table, so geometry is always queried through
/// [`StagingFlash::partition_info`] rather than cached by callers.
pub trait StagingFlash {
    /// Look up the current geometry of a partition. Returns `None` when the
    /// partition table has no entry for `id`.
    fn partition_info(&self, id: PartitionId) -> Option<PartitionInfo>;

    /// Write the full contents of `buf`, starting at `offset` within the partition.
    fn write(&self, id: PartitionId, offset: usize, buf: &[u8]) -> Result<(), FlashDrvError>;

    /// Read from the partition, filling the provided buffer with data.
    fn read(&self, id: PartitionId, offset: usize, buf: &mut [u8]) -> Result<(), FlashDrvError>;

    /// Erase `len` bytes starting at `offset` within the partition.
    fn erase(&self, id: PartitionId, offset: usize, len: usize) -> Result<(), FlashDrvError>;

    /// Write-protect a region. `offset == 0 && len == 0` selects the whole partition.
    fn enable_secure(&self, id: PartitionId, offset: usize, len: usize)
        -> Result<(), FlashDrvError>;

    /// Lift the write protection of a region. `offset == 0 && len == 0` selects
    /// the whole partition.
    fn disable_secure(
        &self,
        id: PartitionId,
        offset: usize,
        len: usize,
    ) -> Result<(), FlashDrvError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum FlashDrvError {
    // Reserved value, for when "no error" / "success" should be
    // encoded in the same numeric representation as FlashDrvError
    //
    // Ok(()) = 0,
    /// Generic failure condition
    FAIL = 1,
    /// Underlying system is busy; retry
    BUSY = 2,
    /// The component is powered down
    OFF = 4,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
    /// Operation is not supported
    NOSUPPORT = 10,
    /// Device is not available
    NODEVICE = 11,
    /// Region is write protected
    LOCKED = 14,
}

impl From<FlashDrvError> for usize {
    fn from(err: FlashDrvError) -> usize {
        err as usize
    }
}

impl fmt::Display for FlashDrvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, usize::from(*self))
    }
}
