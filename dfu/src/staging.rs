// Licensed under the Apache-2.0 license

use crate::error::DfuError;
use crate::session::TransferSession;
use dfu_config::StagingConfig;
use dfu_hil::{PartitionInfo, StagingFlash};
use log::{debug, error};

/// View of the staging partition that a new firmware image is written into.
///
/// Image offsets handed to a `StagingArea` are relative to the image, not to
/// the partition: the first [`StagingConfig::reservation_size`] bytes of the
/// partition hold bootloader metadata and are skipped on every access.
///
/// The partition geometry is looked up from the flash driver on every
/// operation, so changes to the partition table are always observed.
///
/// # Fields
/// - `flash`: Reference to the flash driver that owns the partition table.
/// - `config`: Which partition to use and how large the header reservation is.
pub struct StagingArea<'a, F: StagingFlash + ?Sized> {
    pub(crate) flash: &'a F,
    pub(crate) config: StagingConfig,
}

impl<'a, F: StagingFlash + ?Sized> StagingArea<'a, F> {
    pub fn new(flash: &'a F, config: StagingConfig) -> Self {
        debug!(
            "Staging area on {:?}, reservation {:#x}",
            config.partition,
            config.reservation_size()
        );
        Self { flash, config }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    pub fn reservation_size(&self) -> usize {
        self.config.reservation_size()
    }

    /// Starts a new transfer. The returned session has no checksum until the
    /// first chunk is written into it.
    pub fn begin_transfer(&self) -> TransferSession {
        debug!("Starting new transfer on {:?}", self.config.partition);
        TransferSession::new()
    }

    /// Live geometry of the staging partition.
    pub fn partition_info(&self) -> Result<PartitionInfo, DfuError> {
        self.flash
            .partition_info(self.config.partition)
            .ok_or_else(|| {
                error!("No partition table entry for {:?}", self.config.partition);
                DfuError::PartitionUnavailable(self.config.partition)
            })
    }
}
