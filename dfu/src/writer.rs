// Licensed under the Apache-2.0 license

use crate::checksum::ChecksumAccumulator;
use crate::error::DfuError;
use crate::session::TransferSession;
use crate::staging::StagingArea;
use dfu_hil::StagingFlash;
use log::{debug, error, warn};

/// Upper bound of the scratch buffer used to read a chunk back from flash.
pub const MAX_READ_BACK_BLOCK: usize = 256;

impl<F: StagingFlash + ?Sized> StagingArea<'_, F> {
    /// Writes one chunk of the image at image-relative `offset`, reads it
    /// back, and folds the read-back bytes into `session`'s checksum.
    ///
    /// The checksum therefore describes what is in flash, not what was
    /// requested to be written. The session only advances once the whole chunk
    /// has been read back; on error it is left as it was before the call.
    ///
    /// # Returns
    ///
    /// Returns `Err(DfuError::OutOfRange)` if `offset + payload.len()` exceeds
    /// the partition length, or propagates the driver's write or read error.
    pub fn write_chunk(
        &self,
        session: &mut TransferSession,
        offset: usize,
        payload: &[u8],
    ) -> Result<(), DfuError> {
        let len = payload.len();
        if len == 0 {
            return Err(DfuError::EmptyChunk(offset));
        }

        let partition = self.partition_info()?;
        let out_of_range = DfuError::OutOfRange {
            offset,
            len,
            capacity: partition.length,
        };
        if !partition.contains(offset, len) {
            error!(
                "The write range {:#x}+{:#x} is over the staging partition",
                offset, len
            );
            return Err(out_of_range);
        }
        let addr = self.config.flash_offset(offset).ok_or(out_of_range)?;

        if session.is_out_of_order(offset) {
            warn!(
                "Chunk at {:#x} is below the high-water mark {:#x}",
                offset,
                session.high_water_mark()
            );
        }

        self.flash
            .write(self.config.partition, addr, payload)
            .map_err(|code| {
                error!("Write flash error at {:#x}: {}", addr, code);
                DfuError::FlashWrite { addr, code }
            })?;

        let checksum = self.read_back(session.checksum(), addr, payload)?;
        session.commit(checksum, offset, len);
        debug!(
            "Staged {:#x}+{:#x} at flash offset {:#x}, crc {:04x?}",
            offset,
            len,
            addr,
            session.query_checksum()
        );
        Ok(())
    }

    // Read `payload.len()` bytes at `addr` back in bounded blocks, folding each
    // block into `checksum`.
    fn read_back(
        &self,
        mut checksum: ChecksumAccumulator,
        addr: usize,
        payload: &[u8],
    ) -> Result<ChecksumAccumulator, DfuError> {
        let block = self.config.read_back_block.clamp(1, MAX_READ_BACK_BLOCK);
        let mut scratch = [0u8; MAX_READ_BACK_BLOCK];
        let mut mismatch = None;

        for (index, expected) in payload.chunks(block).enumerate() {
            let block_addr = addr + index * block;
            let buf = &mut scratch[..expected.len()];
            self.flash
                .read(self.config.partition, block_addr, buf)
                .map_err(|code| {
                    error!("Read flash error at {:#x}: {}", block_addr, code);
                    DfuError::FlashRead {
                        addr: block_addr,
                        code,
                    }
                })?;
            if mismatch.is_none() {
                mismatch = buf
                    .iter()
                    .zip(expected)
                    .position(|(got, want)| got != want)
                    .map(|pos| block_addr + pos);
            }
            checksum.fold(buf);
        }

        if let Some(bad_addr) = mismatch {
            warn!(
                "Read-back differs from the written payload at flash offset {:#x}",
                bad_addr
            );
        }
        Ok(checksum)
    }
}
