//! Firmware bindings for the core's store and observer traits
//!
//! The controller runs synchronously inside its task, while flash and the
//! UART are async. Both bindings hand their data to a channel and return.

use defmt::*;
use heapless::String;

use jalousie_core::config::MAX_NAME_LEN;
use jalousie_core::host::{format_notification, Notification};
use jalousie_core::motion::MotionState;
use jalousie_core::traits::{Observer, PositionStore};

use crate::channels::{OUTBOX, PERSIST_PENDING, POSITION_WRITES};

/// Position store backed by the persistence task
///
/// `load` answers from the value read out of flash at boot; `store` queues
/// the write and wakes the persistence task.
pub struct QueuedStore {
    index: usize,
    restored: Option<i32>,
}

impl QueuedStore {
    pub fn new(index: usize, restored: Option<i32>) -> Self {
        Self { index, restored }
    }
}

impl PositionStore for QueuedStore {
    fn load(&mut self, _key: &str) -> Option<i32> {
        self.restored
    }

    fn store(&mut self, _key: &str, value: u8) {
        self.restored = Some(value as i32);
        POSITION_WRITES[self.index].signal(value);
        PERSIST_PENDING.signal(());
    }
}

/// Pushes `evt` lines to the host
pub struct EventSink {
    name: String<MAX_NAME_LEN>,
}

impl EventSink {
    pub fn new(name: String<MAX_NAME_LEN>) -> Self {
        Self { name }
    }

    fn push(&self, notification: Notification) {
        let line = format_notification(&self.name, notification);
        if OUTBOX.try_send(line).is_err() {
            warn!("[{}] host outbox full, dropping {:?}", self.name.as_str(), notification);
        }
    }
}

impl Observer for EventSink {
    fn position_changed(&mut self, position: u8) {
        debug!("[{}] position {}", self.name.as_str(), position);
        self.push(Notification::Position(position));
    }

    fn motion_state_changed(&mut self, state: MotionState) {
        info!("[{}] {}", self.name.as_str(), state.as_str());
        self.push(Notification::State(state));
    }
}
