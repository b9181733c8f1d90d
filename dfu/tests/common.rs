// Licensed under the Apache-2.0 license
#![allow(dead_code)]

use dfu_config::StagingConfig;
use dfu_hil::{PartitionId, PartitionInfo};
use emulator_periph::EmulatedFlash;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simple_logger::SimpleLogger;

pub const STAGING: PartitionId = PartitionId::OtaTemp;
pub const PARTITION_BASE: usize = 0x4_0000;
pub const PARTITION_LEN: usize = 0x1_0000;
// Bootloader metadata found in the reserved sectors before every test.
pub const HEADER_PATTERN: u8 = 0x5a;

pub fn init_logger() {
    // Initialize log level to debug (only once)
    let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
}

/// Emulated flash with a staging partition of `length` bytes. The device is
/// large enough to hold the header reservation plus a full `length` image.
pub fn setup_flash(length: usize) -> EmulatedFlash {
    init_logger();
    let config = StagingConfig::default();
    let flash = EmulatedFlash::new(PARTITION_BASE + config.reservation_size() + length)
        .with_partition(STAGING, PartitionInfo::new(PARTITION_BASE, length));
    flash.preload(
        STAGING,
        0,
        &vec![HEADER_PATTERN; config.reservation_size()],
    );
    flash
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn random_image(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut image = vec![0u8; len];
    rng.fill(&mut image[..]);
    image
}

/// Split `len` bytes into consecutive `(offset, size)` chunks of 1..=`max`
/// bytes.
pub fn random_chunks(rng: &mut StdRng, len: usize, max: usize) -> Vec<(usize, usize)> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < len {
        let size = rng.gen_range(1..=max).min(len - offset);
        chunks.push((offset, size));
        offset += size;
    }
    chunks
}
