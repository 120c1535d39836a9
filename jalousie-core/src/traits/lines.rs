//! Motor line and end-stop traits

use core::fmt::Debug;

use crate::motion::Direction;

/// A pair of one-directional motor lines (raise and lower)
///
/// Polarity is the implementation's concern: "active" means the motor is
/// energized in that direction, whatever level that takes on the wire.
pub trait MotorLines {
    type Error: Debug;

    /// Whether the line for `direction` is currently energized
    fn is_active(&mut self, direction: Direction) -> Result<bool, Self::Error>;

    /// Energize or release the line for `direction`
    ///
    /// Implementations must refuse to energize a line while the opposite one
    /// is active.
    fn set_active(&mut self, direction: Direction, active: bool) -> Result<(), Self::Error>;

    /// Release both lines
    fn release_all(&mut self) -> Result<(), Self::Error> {
        self.set_active(Direction::Up, false)?;
        self.set_active(Direction::Down, false)
    }
}

/// Binary end-stop sensor (asserted at a physical travel limit)
pub trait EndStop {
    type Error: Debug;

    /// Whether the covering is at this limit
    fn is_reached(&mut self) -> Result<bool, Self::Error>;
}
