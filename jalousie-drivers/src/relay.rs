//! Relay pair for a two-line blind motor
//!
//! Blind motors are wired with one relay per direction. Energizing both at
//! once shorts the motor's two windings against each other, so this driver
//! refuses to energize a relay while the opposite one is energized.
//!
//! # Polarity
//!
//! Relay boards are commonly active-low: the relay pulls in when the GPIO is
//! driven low. With [`Polarity::ActiveLow`] "active" is written as
//! [`Level::Low`] and "idle" as [`Level::High`]; [`Polarity::ActiveHigh`]
//! swaps them.

use jalousie_core::config::Polarity;
use jalousie_core::motion::Direction;
use jalousie_core::traits::MotorLines;
use jalousie_hal::{Level, OutputLine};

use crate::DriverError;

/// Raise and lower relay lines
pub struct RelayLines<U, D> {
    up: U,
    down: D,
    polarity: Polarity,
}

impl<U, D> RelayLines<U, D>
where
    U: OutputLine,
    D: OutputLine<Error = U::Error>,
{
    /// Take ownership of both lines and drive them idle
    pub fn new(up: U, down: D, polarity: Polarity) -> Result<Self, DriverError<U::Error>> {
        let mut relays = Self { up, down, polarity };
        relays.write(Direction::Up, false)?;
        relays.write(Direction::Down, false)?;
        Ok(relays)
    }

    fn level(&self, active: bool) -> Level {
        let high = if active {
            self.polarity.active_high()
        } else {
            self.polarity.idle_high()
        };
        Level::from(high)
    }

    fn write(&mut self, direction: Direction, active: bool) -> Result<(), DriverError<U::Error>> {
        let level = self.level(active);
        match direction {
            Direction::Up => self.up.write(level),
            Direction::Down => self.down.write(level),
        }
        .map_err(DriverError::Pin)
    }

    fn read(&mut self, direction: Direction) -> Result<Level, DriverError<U::Error>> {
        match direction {
            Direction::Up => self.up.read(),
            Direction::Down => self.down.read(),
        }
        .map_err(DriverError::Pin)
    }
}

impl<U, D> MotorLines for RelayLines<U, D>
where
    U: OutputLine,
    D: OutputLine<Error = U::Error>,
{
    type Error = DriverError<U::Error>;

    fn is_active(&mut self, direction: Direction) -> Result<bool, Self::Error> {
        let active = self.level(true);
        Ok(self.read(direction)? == active)
    }

    fn set_active(&mut self, direction: Direction, active: bool) -> Result<(), Self::Error> {
        if active && self.is_active(direction.reversed())? {
            return Err(DriverError::Interlock);
        }
        self.write(direction, active)
    }
}
