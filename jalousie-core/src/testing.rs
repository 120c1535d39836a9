//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::string::String;
use std::vec::Vec;

use crate::motion::{Direction, MotionState};
use crate::traits::{EndStop, MotorLines, Observer, PositionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Io,
    Interlock,
}

/// Motor lines recording every write
#[derive(Debug, Default)]
pub struct MockLines {
    pub up: bool,
    pub down: bool,
    pub writes: Vec<(Direction, bool)>,
    /// Set if both lines were ever active together
    pub overlapped: bool,
    pub fail: bool,
    /// Refuse to energize this direction
    pub fail_energize: Option<Direction>,
}

impl MotorLines for MockLines {
    type Error = MockError;

    fn is_active(&mut self, direction: Direction) -> Result<bool, MockError> {
        if self.fail {
            return Err(MockError::Io);
        }
        Ok(match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        })
    }

    fn set_active(&mut self, direction: Direction, active: bool) -> Result<(), MockError> {
        if self.fail || (active && self.fail_energize == Some(direction)) {
            return Err(MockError::Io);
        }
        let other = match direction {
            Direction::Up => self.down,
            Direction::Down => self.up,
        };
        if active && other {
            self.overlapped = true;
            return Err(MockError::Interlock);
        }
        self.writes.push((direction, active));
        match direction {
            Direction::Up => self.up = active,
            Direction::Down => self.down = active,
        }
        Ok(())
    }
}

/// End stop with a settable state and a read counter
#[derive(Debug, Default)]
pub struct MockEndStop {
    pub reached: bool,
    pub reads: usize,
}

impl MockEndStop {
    pub fn new(reached: bool) -> Self {
        Self { reached, reads: 0 }
    }
}

impl EndStop for MockEndStop {
    type Error = MockError;

    fn is_reached(&mut self) -> Result<bool, MockError> {
        self.reads += 1;
        Ok(self.reached)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub values: HashMap<String, i32>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn with(key: &str, value: i32) -> Self {
        let mut store = Self::default();
        store.values.insert(key.into(), value);
        store
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.values.get(key).copied()
    }
}

impl PositionStore for MemoryStore {
    fn load(&mut self, key: &str) -> Option<i32> {
        self.get(key)
    }

    fn store(&mut self, key: &str, value: u8) {
        self.writes += 1;
        self.values.insert(key.into(), i32::from(value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Position(u8),
    State(MotionState),
}

/// Observer recording notifications in order
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Observer for Recorder {
    fn position_changed(&mut self, position: u8) {
        self.events.push(Event::Position(position));
    }

    fn motion_state_changed(&mut self, state: MotionState) {
        self.events.push(Event::State(state));
    }
}
