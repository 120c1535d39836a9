//! Digital line abstractions
//!
//! A motor relay line is a digital output that can be written and read back;
//! an end-stop sensor is a digital input. Both speak in logic [`Level`]s so the
//! polarity decision (active-low vs active-high wiring) stays in one place:
//! the drivers that own the lines.
//!
//! Any `embedded-hal` 1.0 pin satisfies these traits through the blanket
//! implementations below, so chip HALs do not need their own adapters.

use embedded_hal::digital::{InputPin, PinState, StatefulOutputPin};

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

/// Digital output sink
///
/// Writes are expected to take effect immediately. `read` reports the level
/// the line is currently driven to, which lets callers skip redundant writes.
pub trait OutputLine {
    /// Error raised by the underlying hardware
    type Error: core::fmt::Debug;

    /// Drive the line to `level`
    fn write(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Read back the level the line is driven to
    fn read(&mut self) -> Result<Level, Self::Error>;
}

/// Digital input source
pub trait InputLine {
    /// Error raised by the underlying hardware
    type Error: core::fmt::Debug;

    /// Sample the line
    fn read(&mut self) -> Result<Level, Self::Error>;
}

impl<T: StatefulOutputPin> OutputLine for T {
    type Error = T::Error;

    fn write(&mut self, level: Level) -> Result<(), Self::Error> {
        self.set_state(level.into())
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        self.is_set_high().map(Level::from)
    }
}

impl<T: InputPin> InputLine for T {
    type Error = T::Error;

    fn read(&mut self) -> Result<Level, Self::Error> {
        self.is_high().map(Level::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};

    struct MockPin {
        high: bool,
        writes: u32,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    impl StatefulOutputPin for MockPin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert_eq!(PinState::from(Level::High), PinState::High);
        assert_eq!(PinState::from(Level::Low), PinState::Low);
    }

    #[test]
    fn test_output_line_blanket_impl() {
        let mut pin = MockPin {
            high: false,
            writes: 0,
        };

        OutputLine::write(&mut pin, Level::High).unwrap();
        assert_eq!(OutputLine::read(&mut pin), Ok(Level::High));

        OutputLine::write(&mut pin, Level::Low).unwrap();
        assert_eq!(OutputLine::read(&mut pin), Ok(Level::Low));
        assert_eq!(pin.writes, 2);
    }
}
