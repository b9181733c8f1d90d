/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Emulated peripherals backing the DFU pipeline on a host.

--*/

mod flash;
mod system;

pub use flash::{EmulatedFlash, FlashOp, OpKind, ERASED_BYTE};
pub use system::{EmulatedSlots, EmulatedSystem};
