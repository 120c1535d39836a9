//! Position state and its two notifying mutations

use heapless::String;

use crate::config::MAX_NAME_LEN;
use crate::motion::MotionState;
use crate::traits::{Observer, PositionStore};

/// Fully open
pub const MAX_POSITION: u8 = 100;

/// Interpret a stored value, falling back to 0 when absent or out of range
pub fn restore_position(stored: Option<i32>) -> u8 {
    match stored {
        Some(value) if (0..=i32::from(MAX_POSITION)).contains(&value) => value as u8,
        _ => 0,
    }
}

/// Position state of one covering
///
/// Every change of the current position goes through [`set_position`], which
/// persists and notifies. The target is not announced; it is reported when
/// read.
///
/// [`set_position`]: PositionModel::set_position
pub struct PositionModel<P, O> {
    name: String<MAX_NAME_LEN>,
    current: u8,
    target: u8,
    motion: MotionState,
    store: P,
    observer: O,
}

impl<P: PositionStore, O: Observer> PositionModel<P, O> {
    /// Seed the model from the store
    ///
    /// The target starts equal to the restored position and the covering is
    /// assumed to be at rest.
    pub fn new(name: String<MAX_NAME_LEN>, mut store: P, observer: O) -> Self {
        let current = restore_position(store.load(&name));
        Self {
            name,
            current,
            target: current,
            motion: MotionState::Stopped,
            store,
            observer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current estimated position
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Last requested target
    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion
    }

    /// Store, persist and announce a new current position
    pub fn set_position(&mut self, position: u8) {
        let position = position.min(MAX_POSITION);
        self.current = position;
        self.store.store(&self.name, position);
        self.observer.position_changed(position);
    }

    /// Record a new target (not announced)
    pub fn set_target(&mut self, position: u8) {
        self.target = position.min(MAX_POSITION);
    }

    /// Store and announce a motion state
    pub fn set_motion_state(&mut self, state: MotionState) {
        self.motion = state;
        self.observer.motion_state_changed(state);
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, MemoryStore, Recorder};

    fn name(s: &str) -> String<MAX_NAME_LEN> {
        String::try_from(s).unwrap()
    }

    #[test]
    fn test_restore_fallbacks() {
        assert_eq!(restore_position(None), 0);
        assert_eq!(restore_position(Some(-1)), 0);
        assert_eq!(restore_position(Some(101)), 0);
        assert_eq!(restore_position(Some(i32::MAX)), 0);
        assert_eq!(restore_position(Some(0)), 0);
        assert_eq!(restore_position(Some(100)), 100);
        assert_eq!(restore_position(Some(37)), 37);
    }

    #[test]
    fn test_seeded_from_store() {
        let store = MemoryStore::with("living", 30);
        let model = PositionModel::new(name("living"), store, Recorder::default());
        assert_eq!(model.current(), 30);
        assert_eq!(model.target(), 30);
        assert_eq!(model.motion_state(), MotionState::Stopped);
        assert!(model.observer().events.is_empty());
    }

    #[test]
    fn test_invalid_stored_value() {
        let store = MemoryStore::with("living", 250);
        let model = PositionModel::new(name("living"), store, ());
        assert_eq!(model.current(), 0);
    }

    #[test]
    fn test_set_position_persists_and_notifies() {
        let mut model = PositionModel::new(name("living"), MemoryStore::default(), Recorder::default());
        model.set_position(42);
        assert_eq!(model.current(), 42);
        assert_eq!(model.store().get("living"), Some(42));
        assert_eq!(model.observer().events, vec![Event::Position(42)]);
    }

    #[test]
    fn test_clamped_to_range() {
        let mut model = PositionModel::new(name("living"), MemoryStore::default(), ());
        model.set_position(180);
        model.set_target(255);
        assert_eq!(model.current(), 100);
        assert_eq!(model.target(), 100);
        assert_eq!(model.store().get("living"), Some(100));
    }

    #[test]
    fn test_target_not_announced() {
        let mut model = PositionModel::new(name("living"), MemoryStore::default(), Recorder::default());
        model.set_target(70);
        model.set_motion_state(MotionState::Increasing);
        assert_eq!(
            model.observer().events,
            vec![Event::State(MotionState::Increasing)]
        );
        assert_eq!(model.store().writes, 0);
    }
}
