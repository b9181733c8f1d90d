// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "riscv32", no_std)]

pub mod boot;

use dfu_hil::PartitionId;

/// Erase-sector size of the SPI flash holding the staging partition.
pub const SECTOR_SIZE: usize = 4096;

/// Sectors at the start of the staging partition kept for bootloader metadata.
pub const RESERVED_SECTORS: usize = 2;

/// Bytes at the start of the staging partition that image offsets skip over.
pub const RESERVATION_SIZE: usize = RESERVED_SECTORS * SECTOR_SIZE;

/// Configures where and how a firmware image is staged.
/// These are the defaults that can be overridden by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingConfig {
    pub partition: PartitionId,
    pub sector_size: usize,
    pub reserved_sectors: usize,
    /// Largest block read back from flash at a time while verifying a chunk.
    pub read_back_block: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        StagingConfig {
            partition: PartitionId::OtaTemp,
            sector_size: SECTOR_SIZE,
            reserved_sectors: RESERVED_SECTORS,
            read_back_block: 256,
        }
    }
}

impl StagingConfig {
    /// Size of the header reservation in bytes.
    pub fn reservation_size(&self) -> usize {
        self.reserved_sectors * self.sector_size
    }

    /// Translate an image-relative offset into a partition-relative one.
    /// Returns `None` on address overflow.
    pub fn flash_offset(&self, image_offset: usize) -> Option<usize> {
        image_offset.checked_add(self.reservation_size())
    }
}
