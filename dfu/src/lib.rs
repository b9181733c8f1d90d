// Licensed under the Apache-2.0 license

//! Device-side firmware update data path: stages an image chunk by chunk into
//! a flash partition, verifies every chunk by reading it back, and keeps a
//! rolling CRC-16 of what actually landed in flash.

#![cfg_attr(target_arch = "riscv32", no_std)]

pub mod activation;
pub mod checksum;
mod erase;
pub mod error;
pub mod lock;
pub mod session;
pub mod staging;
pub mod update_sm;
mod writer;

pub use activation::{get_active_slot, reboot_into_new_image, set_active_slot};
pub use error::DfuError;
pub use lock::UnlockGuard;
pub use session::TransferSession;
pub use staging::StagingArea;
pub use update_sm::ImageUpdater;
pub use writer::MAX_READ_BACK_BLOCK;
