// Licensed under the Apache-2.0 license

#[cfg(test)]
mod common;

use common::{setup_flash, HEADER_PATTERN, PARTITION_LEN, STAGING};
use dfu_config::StagingConfig;
use dfu_hil::FlashDrvError;
use emulator_periph::{OpKind, ERASED_BYTE};
use mcu_dfu::{DfuError, StagingArea};

#[test]
fn test_erase_preserves_header_reservation() {
    let flash = setup_flash(PARTITION_LEN);
    let area = StagingArea::new(&flash, StagingConfig::default());
    let reservation = area.reservation_size();
    flash.preload(STAGING, reservation, &[0x33; 0x2000]);

    area.unlock().unwrap();
    area.erase_staging_region().unwrap();

    let erases = flash.ops_of(OpKind::Erase);
    assert_eq!(erases.len(), 1);
    assert_eq!(erases[0].offset, reservation);
    assert_eq!(erases[0].len, PARTITION_LEN - reservation);

    assert!(flash
        .contents(STAGING, 0, reservation)
        .iter()
        .all(|b| *b == HEADER_PATTERN));
    assert!(flash
        .contents(STAGING, reservation, PARTITION_LEN - reservation)
        .iter()
        .all(|b| *b == ERASED_BYTE));
}

#[test]
fn test_erase_partition_smaller_than_reservation() {
    let flash = setup_flash(4096);
    let area = StagingArea::new(&flash, StagingConfig::default());
    area.unlock().unwrap();

    assert_eq!(
        area.erase_staging_region(),
        Err(DfuError::OutOfRange {
            offset: 8192,
            len: 0,
            capacity: 4096
        })
    );
    assert!(flash.ops_of(OpKind::Erase).is_empty());
}

#[test]
fn test_erase_failure_reported() {
    let flash = setup_flash(PARTITION_LEN);
    let area = StagingArea::new(&flash, StagingConfig::default());
    area.unlock().unwrap();

    flash.inject_fault(OpKind::Erase, FlashDrvError::BUSY);
    assert_eq!(
        area.erase_staging_region(),
        Err(DfuError::FlashErase {
            addr: area.reservation_size(),
            len: PARTITION_LEN - area.reservation_size(),
            code: FlashDrvError::BUSY
        })
    );
}

#[test]
fn test_erase_requires_unlock() {
    let flash = setup_flash(PARTITION_LEN);
    let area = StagingArea::new(&flash, StagingConfig::default());
    assert!(matches!(
        area.erase_staging_region(),
        Err(DfuError::FlashErase {
            code: FlashDrvError::LOCKED,
            ..
        })
    ));
}

#[test]
fn test_erase_unavailable_partition() {
    let flash = setup_flash(PARTITION_LEN);
    flash.set_partition(STAGING, None);
    let area = StagingArea::new(&flash, StagingConfig::default());
    assert_eq!(
        area.erase_staging_region(),
        Err(DfuError::PartitionUnavailable(STAGING))
    );
}
