//! Motion control
//!
//! Time-based drive pulses on a pair of one-directional motor lines. The
//! motor reports nothing back, so position is advanced by a tick process
//! while the line is held active and snapped to the target on completion.

pub mod driver;
pub mod timer;

pub use driver::{MotionDriver, MotionPlan, Request};
pub use timer::{Deadline, Interval};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Travel direction of the covering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Towards 100 (open)
    Up,
    /// Towards 0 (closed)
    Down,
}

impl Direction {
    /// Direction needed to get from `current` to `target`
    ///
    /// Equal positions count as `Up`; callers filter those out first.
    pub const fn towards(current: u8, target: u8) -> Self {
        if target >= current {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// The opposite direction
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Consumer-visible motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotionState {
    /// Moving towards open
    Increasing,
    /// Moving towards closed
    Decreasing,
    /// Both lines idle
    #[default]
    Stopped,
}

impl MotionState {
    /// Lowercase name used on the host protocol
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stopped => "stopped",
        }
    }

    pub const fn is_moving(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl From<Direction> for MotionState {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::Increasing,
            Direction::Down => Self::Decreasing,
        }
    }
}
