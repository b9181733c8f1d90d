// Licensed under the Apache-2.0 license

//! Lifecycle of one firmware image transfer into the staging partition.
//!
//! ```text
//!   Idle/Verified/Failed --Begin--> Erasing --EraseDone--> Receiving
//!   Receiving --ChunkWritten--> Receiving
//!   Receiving --ImageComplete [digest matches]--> Verified --Activate--> Activated
//!   Receiving --ImageComplete [digest differs]--> Failed
//!   any --Abort--> Failed
//! ```
//!
//! The partition is unlocked while the machine is in `Erasing` or `Receiving`
//! and locked again on every transition out of those states, including when
//! the [`ImageUpdater`] is dropped mid-transfer.

use crate::activation::{reboot_into_new_image, set_active_slot};
use crate::error::DfuError;
use crate::session::TransferSession;
use crate::staging::StagingArea;
use dfu_config::boot::{ImageSlots, SlotId};
use dfu_config::StagingConfig;
use dfu_hil::{StagingFlash, SystemControl};
use log::{debug, error, info};
use smlang::statemachine;

/// Checksum the transport expects versus the checksum staged in flash.
#[derive(Debug, Clone, Copy)]
pub struct ImageDigest {
    pub expected: u16,
    pub actual: Option<u16>,
}

statemachine! {
    derive_states: [Debug, Clone, Copy],
    derive_events: [Debug, Clone],
    transitions: {
        *Idle + Begin = Erasing,
        Verified + Begin = Erasing,
        Failed + Begin = Erasing,

        Erasing + EraseDone = Receiving,

        Receiving + ChunkWritten = Receiving,
        Receiving + ImageComplete(ImageDigest) [is_digest_match] = Verified,
        Receiving + ImageComplete(ImageDigest) [!is_digest_match] = Failed,

        Verified + Activate = Activated,

        _ + Abort = Failed
    }
}

pub struct UpdateContext;

impl StateMachineContext for UpdateContext {
    fn is_digest_match(&self, digest: &ImageDigest) -> Result<bool, ()> {
        Ok(digest.actual == Some(digest.expected))
    }
}

/// Drives a complete transfer: unlock and erase, stage chunks, verify the
/// final checksum, lock, and activate.
pub struct ImageUpdater<'a, F: StagingFlash + ?Sized> {
    area: StagingArea<'a, F>,
    session: TransferSession,
    sm: StateMachine<UpdateContext>,
}

impl<'a, F: StagingFlash + ?Sized> ImageUpdater<'a, F> {
    pub fn new(flash: &'a F, config: StagingConfig) -> Self {
        Self {
            area: StagingArea::new(flash, config),
            session: TransferSession::new(),
            sm: StateMachine::new(UpdateContext),
        }
    }

    pub fn state(&self) -> States {
        *self.sm.state()
    }

    pub fn session(&self) -> &TransferSession {
        &self.session
    }

    pub fn staging_area(&self) -> &StagingArea<'a, F> {
        &self.area
    }

    /// Unlocks and erases the staging region and starts a fresh session.
    pub fn begin(&mut self) -> Result<(), DfuError> {
        self.event(Events::Begin)?;
        self.session = self.area.begin_transfer();

        let prepared = self
            .area
            .unlock()
            .and_then(|()| self.area.erase_staging_region());
        match prepared {
            Ok(()) => self.event(Events::EraseDone),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stages one chunk. Any failure ends the transfer.
    pub fn write_chunk(&mut self, offset: usize, payload: &[u8]) -> Result<(), DfuError> {
        self.expect_state(States::Receiving)?;
        match self.area.write_chunk(&mut self.session, offset, payload) {
            Ok(()) => self.event(Events::ChunkWritten),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Locks the partition and compares the staged checksum against
    /// `expected`. Returns the verified checksum.
    pub fn finish(&mut self, expected: u16) -> Result<u16, DfuError> {
        self.expect_state(States::Receiving)?;
        if let Err(e) = self.area.lock() {
            return Err(self.fail(e));
        }

        let actual = self.session.query_checksum();
        self.event(Events::ImageComplete(ImageDigest { expected, actual }))?;
        if self.state() == States::Failed {
            error!(
                "Image checksum mismatch: expected {:#06x}, staged {:04x?}",
                expected, actual
            );
            return Err(DfuError::ChecksumMismatch { expected, actual });
        }

        info!(
            "Image verified: {} chunks, {:#x} bytes, crc {:#06x}",
            self.session.chunks_written(),
            self.session.bytes_written(),
            expected
        );
        Ok(expected)
    }

    /// Selects `slot` for the next boot and reboots into the verified image.
    pub fn activate(
        &mut self,
        slots: &mut impl ImageSlots,
        system: &impl SystemControl,
        slot: SlotId,
    ) -> Result<(), DfuError> {
        self.expect_state(States::Verified)?;
        set_active_slot(slots, slot)?;
        self.event(Events::Activate)?;
        reboot_into_new_image(system);
        Ok(())
    }

    /// Stops the transfer and locks the partition.
    pub fn abort(&mut self) -> Result<(), DfuError> {
        info!("Transfer aborted in state {:?}", self.state());
        let locked = self.area.lock();
        self.event(Events::Abort)?;
        locked
    }

    fn expect_state(&self, expected: States) -> Result<(), DfuError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(DfuError::InvalidState(state))
        }
    }

    fn event(&mut self, event: Events) -> Result<(), DfuError> {
        let state = self.state();
        debug!("Update event {:?} in state {:?}", event, state);
        self.sm
            .process_event(event)
            .map(|_| ())
            .map_err(|_| DfuError::InvalidState(state))
    }

    // Re-lock and move to Failed, passing the original error through.
    fn fail(&mut self, err: DfuError) -> DfuError {
        error!("Transfer failed in state {:?}: {}", self.state(), err);
        if let Err(e) = self.area.lock() {
            error!("Failed to re-lock staging partition: {}", e);
        }
        let _ = self.sm.process_event(Events::Abort);
        err
    }
}

impl<F: StagingFlash + ?Sized> Drop for ImageUpdater<'_, F> {
    fn drop(&mut self) {
        if matches!(self.state(), States::Erasing | States::Receiving) {
            if let Err(e) = self.area.lock() {
                error!("Failed to re-lock staging partition: {}", e);
            }
        }
    }
}
