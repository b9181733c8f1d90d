// Licensed under the Apache-2.0 license

/// Identifier of a bootable image slot.
pub type SlotId = u8;

/// Trait for querying and selecting the image slot the bootloader starts.
///
/// A change requested through [`ImageSlots::set_active_slot`] takes effect on
/// the next reboot. Requesting the slot that is already active cancels any
/// pending selection.
pub trait ImageSlots {
    /// Determines which slot is booted.
    fn active_slot(&self) -> Result<SlotId, SlotError>;

    /// Selects the slot to boot from after the next reboot.
    fn set_active_slot(&mut self, slot: SlotId) -> Result<(), SlotError>;

    /// Optionally persists the updated selection.
    ///
    /// This method can be overridden to persist changes to non-volatile storage.
    fn persist(&self) -> Result<(), SlotError> {
        Ok(()) // Default: do nothing
    }
}

/// Placeholder slot bookkeeping for single-image devices: always reports slot
/// 0 and accepts any request without persisting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleSlot;

impl ImageSlots for SingleSlot {
    fn active_slot(&self) -> Result<SlotId, SlotError> {
        Ok(0)
    }

    fn set_active_slot(&mut self, _slot: SlotId) -> Result<(), SlotError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    InvalidSlot,
    ReadFailed,
    WriteFailed,
}
