//! RP2040-specific HAL for the blind controller firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `jalousie-hal` traits, plus RP2040-specific functionality:
//!
//! - Pin bank for config-driven GPIO assignment (relays, reed switches)
//! - Flash storage driver (implements `jalousie_hal::FlashStorage`)

#![no_std]

pub mod flash;
pub mod pins;

// Re-export shared traits from jalousie-hal for convenience
pub use jalousie_hal::{FlashStorage as FlashStorageTrait, StorageKey};
