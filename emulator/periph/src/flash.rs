/*++

Licensed under the Apache-2.0 license.

File Name:

    flash.rs

Abstract:

    File contains an in-memory flash device with a partition table, per
    partition write protection, an operation log and fault injection.

--*/

use dfu_hil::{FlashDrvError, PartitionId, PartitionInfo, StagingFlash};
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;

pub const ERASED_BYTE: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Write,
    Read,
    Erase,
    EnableSecure,
    DisableSecure,
}

/// One driver call as seen by the emulated flash. Offsets are partition
/// relative, exactly as the caller passed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashOp {
    pub kind: OpKind,
    pub partition: PartitionId,
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Copy)]
struct BitFlip {
    partition: PartitionId,
    offset: usize,
    mask: u8,
}

/// In-memory flash device.
///
/// Accesses are bounded by the physical device capacity, not by the declared
/// partition length. Partitions start out write protected; writes and erases
/// to a protected partition fail with [`FlashDrvError::LOCKED`].
pub struct EmulatedFlash {
    storage: RefCell<Vec<u8>>,
    partitions: RefCell<HashMap<PartitionId, PartitionInfo>>,
    unlocked: RefCell<HashMap<PartitionId, bool>>,
    ops: RefCell<Vec<FlashOp>>,
    faults: RefCell<HashMap<OpKind, FlashDrvError>>,
    bit_flips: RefCell<Vec<BitFlip>>,
}

impl EmulatedFlash {
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: RefCell::new(vec![ERASED_BYTE; capacity]),
            partitions: Default::default(),
            unlocked: Default::default(),
            ops: Default::default(),
            faults: Default::default(),
            bit_flips: Default::default(),
        }
    }

    pub fn with_partition(self, id: PartitionId, info: PartitionInfo) -> Self {
        self.set_partition(id, Some(info));
        self
    }

    /// Add, replace or (with `None`) remove a partition table entry.
    pub fn set_partition(&self, id: PartitionId, info: Option<PartitionInfo>) {
        let mut partitions = self.partitions.borrow_mut();
        match info {
            Some(info) => partitions.insert(id, info),
            None => partitions.remove(&id),
        };
    }

    pub fn capacity(&self) -> usize {
        self.storage.borrow().len()
    }

    pub fn is_locked(&self, id: PartitionId) -> bool {
        !self.unlocked.borrow().get(&id).copied().unwrap_or(false)
    }

    /// Fail the next operation of `kind` with `code`.
    pub fn inject_fault(&self, kind: OpKind, code: FlashDrvError) {
        self.faults.borrow_mut().insert(kind, code);
    }

    /// Make the byte at partition offset `offset` store `value ^ mask` whenever
    /// it is programmed, as if some cells failed to program.
    pub fn inject_bit_flip(&self, id: PartitionId, offset: usize, mask: u8) {
        self.bit_flips.borrow_mut().push(BitFlip {
            partition: id,
            offset,
            mask,
        });
    }

    pub fn ops(&self) -> Vec<FlashOp> {
        self.ops.borrow().clone()
    }

    pub fn ops_of(&self, kind: OpKind) -> Vec<FlashOp> {
        self.ops
            .borrow()
            .iter()
            .filter(|op| op.kind == kind)
            .copied()
            .collect()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Raw content of a partition region, bypassing the operation log. Empty if
    /// the region is outside the device.
    pub fn contents(&self, id: PartitionId, offset: usize, len: usize) -> Vec<u8> {
        match self.physical(id, offset, len) {
            Ok(start) => self.storage.borrow()[start..start + len].to_vec(),
            Err(_) => Vec::new(),
        }
    }

    /// Program raw content, bypassing protection and the operation log.
    pub fn preload(&self, id: PartitionId, offset: usize, data: &[u8]) {
        if let Ok(start) = self.physical(id, offset, data.len()) {
            self.storage.borrow_mut()[start..start + data.len()].copy_from_slice(data);
        }
    }

    fn physical(
        &self,
        id: PartitionId,
        offset: usize,
        len: usize,
    ) -> Result<usize, FlashDrvError> {
        let info = self
            .partitions
            .borrow()
            .get(&id)
            .copied()
            .ok_or(FlashDrvError::NODEVICE)?;
        let start = info.base.checked_add(offset).ok_or(FlashDrvError::INVAL)?;
        match start.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(start),
            _ => Err(FlashDrvError::SIZE),
        }
    }

    fn begin(
        &self,
        kind: OpKind,
        id: PartitionId,
        offset: usize,
        len: usize,
    ) -> Result<(), FlashDrvError> {
        trace!("{:?} {:?} {:#x}+{:#x}", kind, id, offset, len);
        self.ops.borrow_mut().push(FlashOp {
            kind,
            partition: id,
            offset,
            len,
        });
        match self.faults.borrow_mut().remove(&kind) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn check_writable(&self, id: PartitionId) -> Result<(), FlashDrvError> {
        if self.is_locked(id) {
            Err(FlashDrvError::LOCKED)
        } else {
            Ok(())
        }
    }

    fn set_secure(&self, id: PartitionId, locked: bool) -> Result<(), FlashDrvError> {
        if !self.partitions.borrow().contains_key(&id) {
            return Err(FlashDrvError::NODEVICE);
        }
        self.unlocked.borrow_mut().insert(id, !locked);
        Ok(())
    }
}

impl StagingFlash for EmulatedFlash {
    fn partition_info(&self, id: PartitionId) -> Option<PartitionInfo> {
        self.partitions.borrow().get(&id).copied()
    }

    fn write(&self, id: PartitionId, offset: usize, buf: &[u8]) -> Result<(), FlashDrvError> {
        self.begin(OpKind::Write, id, offset, buf.len())?;
        self.check_writable(id)?;
        let start = self.physical(id, offset, buf.len())?;

        let mut storage = self.storage.borrow_mut();
        storage[start..start + buf.len()].copy_from_slice(buf);
        for flip in self.bit_flips.borrow().iter() {
            if flip.partition == id && (offset..offset + buf.len()).contains(&flip.offset) {
                storage[start + flip.offset - offset] ^= flip.mask;
            }
        }
        Ok(())
    }

    fn read(&self, id: PartitionId, offset: usize, buf: &mut [u8]) -> Result<(), FlashDrvError> {
        self.begin(OpKind::Read, id, offset, buf.len())?;
        let start = self.physical(id, offset, buf.len())?;
        buf.copy_from_slice(&self.storage.borrow()[start..start + buf.len()]);
        Ok(())
    }

    fn erase(&self, id: PartitionId, offset: usize, len: usize) -> Result<(), FlashDrvError> {
        self.begin(OpKind::Erase, id, offset, len)?;
        self.check_writable(id)?;
        let start = self.physical(id, offset, len)?;
        self.storage.borrow_mut()[start..start + len].fill(ERASED_BYTE);
        Ok(())
    }

    fn enable_secure(
        &self,
        id: PartitionId,
        offset: usize,
        len: usize,
    ) -> Result<(), FlashDrvError> {
        self.begin(OpKind::EnableSecure, id, offset, len)?;
        self.set_secure(id, true)
    }

    fn disable_secure(
        &self,
        id: PartitionId,
        offset: usize,
        len: usize,
    ) -> Result<(), FlashDrvError> {
        self.begin(OpKind::DisableSecure, id, offset, len)?;
        self.set_secure(id, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn flash() -> EmulatedFlash {
        EmulatedFlash::new(0x400)
            .with_partition(PartitionId::OtaTemp, PartitionInfo::new(0x100, 0x100))
    }

    #[test]
    fn test_write_requires_unlock() {
        let flash = flash();
        assert!(flash.is_locked(PartitionId::OtaTemp));
        assert_eq!(
            flash.write(PartitionId::OtaTemp, 0, &[1, 2, 3]),
            Err(FlashDrvError::LOCKED)
        );

        flash.disable_secure(PartitionId::OtaTemp, 0, 0).unwrap();
        flash.write(PartitionId::OtaTemp, 0, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        flash.read(PartitionId::OtaTemp, 0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(flash.storage.borrow()[0x100], 1);
    }

    #[test]
    fn test_access_beyond_partition_bounded_by_capacity() {
        let flash = flash();
        flash.disable_secure(PartitionId::OtaTemp, 0, 0).unwrap();
        // Past the declared length but within the device.
        flash.write(PartitionId::OtaTemp, 0x200, &[0xaa; 0x100]).unwrap();
        assert_eq!(
            flash.write(PartitionId::OtaTemp, 0x2ff, &[0; 2]),
            Err(FlashDrvError::SIZE)
        );
    }

    #[test]
    fn test_fault_is_one_shot() {
        let flash = flash();
        flash.inject_fault(OpKind::Read, FlashDrvError::BUSY);
        let mut buf = [0u8; 4];
        assert_eq!(
            flash.read(PartitionId::OtaTemp, 0, &mut buf),
            Err(FlashDrvError::BUSY)
        );
        assert_eq!(flash.read(PartitionId::OtaTemp, 0, &mut buf), Ok(()));
        assert_eq!(flash.ops_of(OpKind::Read).len(), 2);
    }

    #[test]
    fn test_bit_flip_applies_on_program() {
        let flash = flash();
        flash.disable_secure(PartitionId::OtaTemp, 0, 0).unwrap();
        flash.inject_bit_flip(PartitionId::OtaTemp, 5, 0x01);
        flash.write(PartitionId::OtaTemp, 4, &[0x10, 0x20, 0x30]).unwrap();
        assert_eq!(
            flash.contents(PartitionId::OtaTemp, 4, 3),
            vec![0x10, 0x21, 0x30]
        );
    }

    #[test]
    fn test_erase_and_missing_partition() {
        let flash = flash();
        flash.disable_secure(PartitionId::OtaTemp, 0, 0).unwrap();
        flash.write(PartitionId::OtaTemp, 0, &[0; 8]).unwrap();
        flash.erase(PartitionId::OtaTemp, 2, 4).unwrap();
        assert_eq!(
            flash.contents(PartitionId::OtaTemp, 0, 8),
            vec![0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0]
        );

        flash.set_partition(PartitionId::OtaTemp, None);
        assert_eq!(flash.partition_info(PartitionId::OtaTemp), None);
        assert_eq!(
            flash.enable_secure(PartitionId::OtaTemp, 0, 0),
            Err(FlashDrvError::NODEVICE)
        );
    }
}
