/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the DFU staging emulator.

--*/

use clap::Parser;
use dfu_emulator::{run, DfuEmulatorArgs};
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> anyhow::Result<()> {
    let cli = DfuEmulatorArgs::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = SimpleLogger::new().with_level(level).init();

    let report = run(&cli)?;
    println!(
        "Staged {} bytes in {} chunks, crc {:#06x}, booted slot {}",
        report.bytes, report.chunks, report.checksum, report.active_slot
    );
    Ok(())
}
