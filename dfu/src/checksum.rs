// Licensed under the Apache-2.0 license

//! Rolling CRC-16/CCITT-FALSE over a staged image.
//!
//! The algorithm has no reflection and no final xor, so the value returned
//! after a chunk is also the register state to continue from. Folding chunk
//! by chunk therefore gives the same result as one pass over the whole image.

use crc::{Crc, CRC_16_IBM_3740};

pub const CRC16_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Fold `bytes` into a checksum. `None` starts a new checksum from this
/// buffer, `Some(state)` continues the chain from `state`.
pub fn fold(bytes: &[u8], prior: Option<u16>) -> u16 {
    let mut digest = match prior {
        None => CRC16_CCITT.digest(),
        Some(state) => CRC16_CCITT.digest_with_initial(state),
    };
    digest.update(bytes);
    digest.finalize()
}

/// Checksum of a complete image in one pass.
pub fn image_checksum(image: &[u8]) -> u16 {
    CRC16_CCITT.checksum(image)
}

/// Running checksum of everything folded so far. `None` means nothing has
/// been folded yet, which is distinct from a checksum that happens to be zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumAccumulator {
    state: Option<u16>,
}

impl ChecksumAccumulator {
    pub const fn new() -> Self {
        Self { state: None }
    }

    pub fn fold(&mut self, bytes: &[u8]) -> u16 {
        let next = fold(bytes, self.state);
        self.state = Some(next);
        next
    }

    pub fn query(&self) -> Option<u16> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(image_checksum(b"123456789"), 0x29b1);
        assert_eq!(fold(b"123456789", None), 0x29b1);
    }

    #[test]
    fn test_chained_fold_matches_single_pass() {
        let image: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        let whole = image_checksum(&image);
        for split in [1, 17, 256, 999] {
            let (head, tail) = image.split_at(split);
            assert_eq!(fold(tail, Some(fold(head, None))), whole);
        }
    }

    #[test]
    fn test_accumulator_states() {
        let mut acc = ChecksumAccumulator::new();
        assert_eq!(acc.query(), None);

        acc.fold(b"1234");
        acc.fold(b"56789");
        assert_eq!(acc.query(), Some(0x29b1));

        acc.reset();
        assert_eq!(acc.query(), None);
    }

    #[test]
    fn test_empty_buffer_keeps_chain() {
        let state = fold(b"abc", None);
        assert_eq!(fold(&[], Some(state)), state);
        // An empty image still has the algorithm's initial value.
        assert_eq!(fold(&[], None), 0xffff);
    }
}
