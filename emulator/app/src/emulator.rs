/*++

Licensed under the Apache-2.0 license.

File Name:

    emulator.rs

Abstract:

    File contains the command line arguments and the update run that stages
    an image file into emulated flash, verifies it and activates it.

--*/

use anyhow::{bail, Context, Result};
use clap::Parser;
use clap_num::maybe_hex;
use dfu_config::boot::SlotId;
use dfu_config::{StagingConfig, RESERVED_SECTORS, SECTOR_SIZE};
use dfu_hil::{PartitionId, PartitionInfo};
use emulator_periph::{EmulatedFlash, EmulatedSlots, EmulatedSystem};
use log::{info, warn};
use mcu_dfu::checksum::image_checksum;
use mcu_dfu::{ImageUpdater, MAX_READ_BACK_BLOCK};
use std::path::PathBuf;

const STAGING_PARTITION: PartitionId = PartitionId::OtaTemp;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "DFU Staging Emulator")]
pub struct DfuEmulatorArgs {
    /// Firmware image to stage
    #[arg(short, long)]
    pub image: PathBuf,

    /// Payload bytes per chunk, as delivered by the transport
    #[arg(short, long, value_parser = maybe_hex::<usize>, default_value_t = 256)]
    pub chunk_size: usize,

    #[arg(long, value_parser = maybe_hex::<usize>, default_value_t = 0x10_0000)]
    pub partition_base: usize,

    /// Declared length of the staging partition
    #[arg(long, value_parser = maybe_hex::<usize>, default_value_t = 0x4_0000)]
    pub partition_length: usize,

    #[arg(long, value_parser = maybe_hex::<usize>, default_value_t = SECTOR_SIZE)]
    pub sector_size: usize,

    /// Sectors kept free for the bootloader image header
    #[arg(long, default_value_t = RESERVED_SECTORS)]
    pub reserved_sectors: usize,

    #[arg(long, value_parser = maybe_hex::<usize>, default_value_t = MAX_READ_BACK_BLOCK)]
    pub read_back_block: usize,

    /// Checksum announced by the transport. Defaults to the checksum of the
    /// image file.
    #[arg(long, value_parser = maybe_hex::<u16>)]
    pub expected_crc: Option<u16>,

    /// Image offset of a byte that is corrupted while it is programmed
    #[arg(long, value_parser = maybe_hex::<usize>)]
    pub flip_bit: Option<usize>,

    #[arg(long, value_parser = maybe_hex::<u8>, default_value_t = 0x01)]
    pub flip_mask: u8,

    /// Number of image slots on the device
    #[arg(long, default_value_t = 2)]
    pub slots: SlotId,

    /// Slot to boot once the image is verified
    #[arg(long, default_value_t = 1)]
    pub slot: SlotId,

    /// Write the staged image, as read back from flash, to this file
    #[arg(long)]
    pub dump: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Outcome of a successful update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub checksum: u16,
    pub chunks: usize,
    pub bytes: usize,
    pub active_slot: SlotId,
    pub reboots: usize,
}

pub fn run(cli: &DfuEmulatorArgs) -> Result<UpdateReport> {
    let image = std::fs::read(&cli.image)
        .with_context(|| format!("Unable to read image {}", cli.image.display()))?;
    if image.is_empty() {
        bail!("Image {} is empty", cli.image.display());
    }
    if cli.chunk_size == 0 {
        bail!("Chunk size must be non-zero");
    }

    let config = StagingConfig {
        partition: STAGING_PARTITION,
        sector_size: cli.sector_size,
        reserved_sectors: cli.reserved_sectors,
        read_back_block: cli.read_back_block,
    };
    // The device holds the reservation plus a full partition length of image.
    let capacity = cli
        .partition_base
        .checked_add(config.reservation_size())
        .and_then(|end| end.checked_add(cli.partition_length))
        .context("Partition layout overflows the address space")?;
    let flash = EmulatedFlash::new(capacity).with_partition(
        STAGING_PARTITION,
        PartitionInfo::new(cli.partition_base, cli.partition_length),
    );
    if let Some(offset) = cli.flip_bit {
        warn!("Corrupting image byte {:#x} with mask {:#04x}", offset, cli.flip_mask);
        flash.inject_bit_flip(
            STAGING_PARTITION,
            config.reservation_size() + offset,
            cli.flip_mask,
        );
    }

    let expected = cli.expected_crc.unwrap_or_else(|| image_checksum(&image));
    info!(
        "Staging {} ({:#x} bytes, crc {:#06x}) in {:#x} byte chunks",
        cli.image.display(),
        image.len(),
        expected,
        cli.chunk_size
    );

    let mut updater = ImageUpdater::new(&flash, config);
    updater.begin().context("Failed to prepare staging partition")?;
    for (index, chunk) in image.chunks(cli.chunk_size).enumerate() {
        let offset = index * cli.chunk_size;
        updater
            .write_chunk(offset, chunk)
            .with_context(|| format!("Failed to stage chunk at {:#x}", offset))?;
    }
    let checksum = updater
        .finish(expected)
        .context("Staged image failed verification")?;

    if let Some(path) = &cli.dump {
        let staged = flash.contents(STAGING_PARTITION, config.reservation_size(), image.len());
        std::fs::write(path, staged)
            .with_context(|| format!("Unable to write {}", path.display()))?;
    }

    let mut slots = EmulatedSlots::new(cli.slots);
    let system = EmulatedSystem::new();
    updater
        .activate(&mut slots, &system, cli.slot)
        .context("Failed to activate staged image")?;
    let active_slot = slots.boot();

    let session = updater.session();
    Ok(UpdateReport {
        checksum,
        chunks: session.chunks_written(),
        bytes: session.bytes_written(),
        active_slot,
        reboots: system.reboot_count(),
    })
}
