/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Host emulator that stages a firmware image through the DFU pipeline.

--*/

mod emulator;

pub use emulator::{run, DfuEmulatorArgs, UpdateReport};
