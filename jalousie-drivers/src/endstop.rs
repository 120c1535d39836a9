//! Reed-switch end stop
//!
//! A magnet on the bottom rail closes the switch at the travel limit. The
//! switch usually shorts a pulled-up GPIO to ground, so asserted reads low
//! ([`Polarity::ActiveLow`], the default).

use jalousie_core::config::Polarity;
use jalousie_core::traits::EndStop;
use jalousie_hal::{InputLine, Level};

use crate::DriverError;

/// End stop backed by a digital input
pub struct ReedSwitch<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: InputLine> ReedSwitch<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }
}

impl<P: InputLine> EndStop for ReedSwitch<P> {
    type Error = DriverError<P::Error>;

    fn is_reached(&mut self) -> Result<bool, Self::Error> {
        let level = self.pin.read().map_err(DriverError::Pin)?;
        Ok(level == Level::from(self.polarity.active_high()))
    }
}
