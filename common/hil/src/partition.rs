// Licensed under the Apache-2.0 license

/// Logical partitions known to the flash driver's partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionId {
    Bootloader = 0,
    Application = 1,
    OtaTemp = 2,
    Parameters = 3,
}

/// Geometry of a partition as reported by the partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionInfo {
    pub base: usize,   // partition offset within the flash device in bytes
    pub length: usize, // size in bytes
}

impl PartitionInfo {
    pub const fn new(base: usize, length: usize) -> Self {
        Self { base, length }
    }

    /// Returns true if `[offset, offset + len)` lies within the partition.
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.length)
    }
}
