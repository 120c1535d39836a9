//! Configuration and persisted state
//!
//! - `loader`: blind positions restored from flash at boot
//!
//! The blind table itself comes from `blinds.toml`, parsed by
//! `jalousie_core::config::parse_config`.

pub mod loader;

pub use loader::{load_positions, RestoredPositions};
