//! Persistence and notification traits

use crate::motion::MotionState;

/// Integer store keyed by device name
///
/// Implementations may persist synchronously or queue the write, as long as
/// the value is accepted before `store` returns.
pub trait PositionStore {
    /// Last stored value for `key`, `None` if absent or unreadable
    fn load(&mut self, key: &str) -> Option<i32>;

    /// Record `value` for `key`
    fn store(&mut self, key: &str, value: u8);
}

/// Consumer of position and motion-state changes
pub trait Observer {
    fn position_changed(&mut self, _position: u8) {}

    fn motion_state_changed(&mut self, _state: MotionState) {}
}

/// Discard all notifications
impl Observer for () {}

impl<T: PositionStore + ?Sized> PositionStore for &mut T {
    fn load(&mut self, key: &str) -> Option<i32> {
        (**self).load(key)
    }

    fn store(&mut self, key: &str, value: u8) {
        (**self).store(key, value)
    }
}

impl<T: Observer + ?Sized> Observer for &mut T {
    fn position_changed(&mut self, position: u8) {
        (**self).position_changed(position)
    }

    fn motion_state_changed(&mut self, state: MotionState) {
        (**self).motion_state_changed(state)
    }
}
