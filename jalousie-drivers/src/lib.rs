//! Hardware driver implementations
//!
//! Concrete implementations of the line traits defined in jalousie-core,
//! built on the digital lines from jalousie-hal:
//!
//! - [`relay::RelayLines`]: raise/lower relay pair with polarity and interlock
//! - [`endstop::ReedSwitch`]: end-stop reed switch with configurable polarity

#![no_std]
#![deny(unsafe_code)]

pub mod endstop;
pub mod relay;

pub use endstop::ReedSwitch;
pub use relay::RelayLines;

/// Driver failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E> {
    /// Underlying pin reported an error
    Pin(E),
    /// Refused to energize a relay while the opposite one is energized
    Interlock,
}

