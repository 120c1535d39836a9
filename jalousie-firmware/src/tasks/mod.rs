//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod blind;
pub mod host_rx;
pub mod host_tx;
pub mod persist;

pub use blind::{blind_task, Blind};
pub use host_rx::host_rx_task;
pub use host_tx::host_tx_task;
pub use persist::persist_task;
