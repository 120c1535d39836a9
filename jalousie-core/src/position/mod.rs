//! Position model
//!
//! Estimated position, last requested target and motion state of a single
//! covering. 0 is fully closed, 100 fully open.

pub mod model;

pub use model::{restore_position, PositionModel, MAX_POSITION};
