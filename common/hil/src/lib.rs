// Licensed under the Apache-2.0 license

//! Interfaces to the collaborators the DFU pipeline does not own: the flash
//! driver with its partition table, and the system reset controller.

#![cfg_attr(target_arch = "riscv32", no_std)]

pub mod flash;
pub mod partition;
pub mod system;

pub use flash::{FlashDrvError, StagingFlash};
pub use partition::{PartitionId, PartitionInfo};
pub use system::SystemControl;
