//! Hardware abstraction traits
//!
//! These traits define the interface between the blind logic and the
//! hardware- or host-specific implementations injected into the controller.

pub mod lines;
pub mod store;

pub use lines::{EndStop, MotorLines};
pub use store::{Observer, PositionStore};
