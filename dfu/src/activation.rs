// Licensed under the Apache-2.0 license

//! Hand-off from a staged image to the bootloader.

use crate::error::DfuError;
use dfu_config::boot::{ImageSlots, SlotId};
use dfu_hil::SystemControl;
use log::{error, info, warn};

/// Reboots so that the bootloader picks up the staged image.
pub fn reboot_into_new_image(system: &impl SystemControl) {
    info!("Rebooting into new image");
    system.reboot();
}

/// Slot the device is currently running from.
pub fn get_active_slot(slots: &impl ImageSlots) -> Result<SlotId, DfuError> {
    Ok(slots.active_slot()?)
}

/// Requests `slot` to be booted after the next reboot. The latest request
/// wins: selecting the running slot cancels an earlier pending selection.
///
/// If the selection cannot be persisted, the running slot is selected again
/// before the error is returned, so a failed request never switches slots on
/// the next reboot.
pub fn set_active_slot(slots: &mut impl ImageSlots, slot: SlotId) -> Result<(), DfuError> {
    let current = slots.active_slot()?;
    slots.set_active_slot(slot)?;
    if let Err(e) = slots.persist() {
        warn!("Slot selection {} not persisted: {:?}", slot, e);
        if let Err(rollback) = slots.set_active_slot(current) {
            error!("Failed to restore slot {} selection: {:?}", current, rollback);
        }
        return Err(e.into());
    }
    if current == slot {
        info!("Slot {} stays active on next reboot", slot);
    } else {
        info!("Active slot {} -> {} on next reboot", current, slot);
    }
    Ok(())
}
