// Licensed under the Apache-2.0 license

use crate::error::DfuError;
use crate::staging::StagingArea;
use dfu_hil::StagingFlash;
use log::{error, info};

impl<F: StagingFlash + ?Sized> StagingArea<'_, F> {
    /// Erases the writable part of the staging partition, everything after the
    /// header reservation. The reserved sectors are never touched.
    ///
    /// There is no partial-erase resume: after a failure the partition content
    /// is indeterminate and the transfer has to restart from this step.
    pub fn erase_staging_region(&self) -> Result<(), DfuError> {
        let partition = self.partition_info()?;
        let start = self.reservation_size();
        let len = partition
            .length
            .checked_sub(start)
            .ok_or(DfuError::OutOfRange {
                offset: start,
                len: 0,
                capacity: partition.length,
            })?;

        info!("Erase staging region {:#x}+{:#x}", start, len);
        self.flash
            .erase(self.config.partition, start, len)
            .map_err(|code| {
                error!("Erase flash error: {}", code);
                DfuError::FlashErase {
                    addr: start,
                    len,
                    code,
                }
            })
    }
}
