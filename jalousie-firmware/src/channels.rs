//! Inter-task communication channels
//!
//! Blind tasks are addressed by their index in `BlindsConfig::blinds`, so
//! every per-blind primitive is a fixed array of `MAX_BLINDS` entries.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use jalousie_core::config::MAX_BLINDS;
use jalousie_core::host::{Command, Line};

/// Queued host requests per blind
const REQUEST_QUEUE_SIZE: usize = 4;

/// Lines waiting for the host UART
const OUTBOX_SIZE: usize = 16;

/// Host requests routed to each blind task
pub static BLIND_REQUESTS: [Channel<CriticalSectionRawMutex, Command, REQUEST_QUEUE_SIZE>;
    MAX_BLINDS] = [const { Channel::new() }; MAX_BLINDS];

/// Replies and event lines for the host
pub static OUTBOX: Channel<CriticalSectionRawMutex, Line, OUTBOX_SIZE> = Channel::new();

/// Latest position to persist for each blind
///
/// A signal only keeps the last value, so a burst of ticks collapses into a
/// single flash write.
pub static POSITION_WRITES: [Signal<CriticalSectionRawMutex, u8>; MAX_BLINDS] =
    [const { Signal::new() }; MAX_BLINDS];

/// Wakes the persistence task after any `POSITION_WRITES` update
pub static PERSIST_PENDING: Signal<CriticalSectionRawMutex, ()> = Signal::new();
