// Licensed under the Apache-2.0 license

//! Write protection of the staging partition.
//!
//! The partition must be unlocked for the erase/write sequence of a transfer
//! and locked again afterwards on every exit path. [`StagingArea::unlocked`]
//! returns a guard that takes care of the second half.

use crate::error::DfuError;
use crate::staging::StagingArea;
use dfu_hil::StagingFlash;
use log::{debug, error};

// offset 0, length 0 selects the whole partition in the driver's convention
const WHOLE_PARTITION: (usize, usize) = (0, 0);

impl<'a, F: StagingFlash + ?Sized> StagingArea<'a, F> {
    /// Write-protects the whole staging partition.
    pub fn lock(&self) -> Result<(), DfuError> {
        debug!("Lock {:?}", self.config.partition);
        let (offset, len) = WHOLE_PARTITION;
        self.flash
            .enable_secure(self.config.partition, offset, len)
            .map_err(|code| {
                error!("Lock flash error on {:?}: {}", self.config.partition, code);
                DfuError::SecureToggle { code }
            })
    }

    /// Lifts the write protection of the whole staging partition.
    pub fn unlock(&self) -> Result<(), DfuError> {
        debug!("Unlock {:?}", self.config.partition);
        let (offset, len) = WHOLE_PARTITION;
        self.flash
            .disable_secure(self.config.partition, offset, len)
            .map_err(|code| {
                error!("Unlock flash error on {:?}: {}", self.config.partition, code);
                DfuError::SecureToggle { code }
            })
    }

    /// Unlocks the partition and returns a guard that locks it again when
    /// dropped.
    pub fn unlocked(&self) -> Result<UnlockGuard<'_, 'a, F>, DfuError> {
        self.unlock()?;
        Ok(UnlockGuard {
            area: self,
            armed: true,
        })
    }
}

/// Keeps the staging partition unlocked for as long as it is alive.
#[must_use = "the partition is locked again as soon as the guard is dropped"]
pub struct UnlockGuard<'g, 'a, F: StagingFlash + ?Sized> {
    area: &'g StagingArea<'a, F>,
    armed: bool,
}

impl<F: StagingFlash + ?Sized> UnlockGuard<'_, '_, F> {
    /// Locks the partition now and reports the outcome, instead of leaving it
    /// to the drop handler which can only log a failure.
    pub fn relock(mut self) -> Result<(), DfuError> {
        self.armed = false;
        self.area.lock()
    }
}

impl<F: StagingFlash + ?Sized> Drop for UnlockGuard<'_, '_, F> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.area.lock() {
                error!("Failed to re-lock staging partition: {}", e);
            }
        }
    }
}
