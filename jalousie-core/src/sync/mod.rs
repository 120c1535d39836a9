//! Estimate reconciliation against end-stop sensors

pub mod reconciler;

pub use reconciler::{Correction, Reconciler};
