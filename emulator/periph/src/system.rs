/*++

Licensed under the Apache-2.0 license.

File Name:

    system.rs

Abstract:

    File contains the emulated reset controller and image slot bookkeeping.

--*/

use dfu_config::boot::{ImageSlots, SlotError, SlotId};
use dfu_hil::SystemControl;
use log::info;
use std::cell::Cell;

/// Reset controller that counts reboot requests instead of resetting.
#[derive(Debug, Default)]
pub struct EmulatedSystem {
    reboots: Cell<usize>,
}

impl EmulatedSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reboot_count(&self) -> usize {
        self.reboots.get()
    }
}

impl SystemControl for EmulatedSystem {
    fn reboot(&self) {
        info!("Emulated reboot requested");
        self.reboots.set(self.reboots.get() + 1);
    }
}

/// Slot bookkeeping for a device with `count` image slots. A selection only
/// becomes the active slot once [`EmulatedSlots::boot`] runs.
#[derive(Debug, Clone)]
pub struct EmulatedSlots {
    count: SlotId,
    active: SlotId,
    pending: Option<SlotId>,
    fail_persist: bool,
}

impl EmulatedSlots {
    pub fn new(count: SlotId) -> Self {
        Self {
            count,
            active: 0,
            pending: None,
            fail_persist: false,
        }
    }

    /// Make every following `persist` fail with [`SlotError::WriteFailed`].
    pub fn set_fail_persist(&mut self, fail: bool) {
        self.fail_persist = fail;
    }

    pub fn pending_slot(&self) -> Option<SlotId> {
        self.pending
    }

    /// Apply the pending selection, as the bootloader would after a reset.
    pub fn boot(&mut self) -> SlotId {
        if let Some(slot) = self.pending.take() {
            self.active = slot;
        }
        self.active
    }
}

impl ImageSlots for EmulatedSlots {
    fn active_slot(&self) -> Result<SlotId, SlotError> {
        Ok(self.active)
    }

    fn set_active_slot(&mut self, slot: SlotId) -> Result<(), SlotError> {
        if slot >= self.count {
            return Err(SlotError::InvalidSlot);
        }
        self.pending = (slot != self.active).then_some(slot);
        Ok(())
    }

    fn persist(&self) -> Result<(), SlotError> {
        if self.fail_persist {
            Err(SlotError::WriteFailed)
        } else {
            Ok(())
        }
    }
}
