//! Board-agnostic core logic for the blind controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Configuration types and the embedded TOML loader
//! - Position model (estimated position, target, motion state)
//! - Motion driver (timed drive pulses, reversal, tick estimation)
//! - Sensor reconciliation against end-stop switches
//! - The blind controller tying the three together
//! - Host line protocol (request parsing, reply formatting)
//! - Hardware abstraction traits (motor lines, end stops, storage)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod host;
pub mod motion;
pub mod position;
pub mod sync;
pub mod traits;

pub use controller::{BlindController, BlindError, TargetReading};

#[cfg(test)]
pub(crate) mod testing;
