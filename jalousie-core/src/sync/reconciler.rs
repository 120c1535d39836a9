//! Sensor reconciler
//!
//! Runs lazily, on every read of the target position. Rules are checked in
//! fixed priority and the first match wins:
//!
//! 1. not at 0 but the closed switch is asserted: snap to 0
//! 2. not at 100 but the open switch is asserted: snap to 100
//! 3. at 0 with the closed switch released, or at 100 with the open switch
//!    released: the estimate is wrong but the real position is unknown, snap
//!    to 50
//!
//! Each switch is read at most once per check and only when a rule needs it.
//! Both switches asserted at once is a wiring fault and yields no correction.

use crate::traits::EndStop;

/// Position correction derived from the switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Correction {
    /// Closed switch asserted
    Closed,
    /// Open switch asserted
    Open,
    /// At a limit whose switch is released
    Midway,
}

impl Correction {
    /// Position the estimate snaps to
    pub const fn position(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 100,
            Self::Midway => 50,
        }
    }
}

/// Optional closed/open end stops
pub struct Reconciler<S> {
    closed: Option<S>,
    open: Option<S>,
}

/// One switch, read on first use
struct Reading<'a, S> {
    sensor: Option<&'a mut S>,
    value: Option<bool>,
}

impl<'a, S: EndStop> Reading<'a, S> {
    fn new(sensor: Option<&'a mut S>) -> Self {
        Self {
            sensor,
            value: None,
        }
    }

    /// `None` when the switch is not fitted
    fn get(&mut self) -> Result<Option<bool>, S::Error> {
        if self.value.is_none() {
            if let Some(sensor) = self.sensor.as_mut() {
                self.value = Some(sensor.is_reached()?);
            }
        }
        Ok(self.value)
    }

    fn is_asserted(&mut self) -> Result<bool, S::Error> {
        Ok(self.get()? == Some(true))
    }

    fn is_released(&mut self) -> Result<bool, S::Error> {
        Ok(self.get()? == Some(false))
    }
}

impl<S: EndStop> Reconciler<S> {
    pub fn new(closed: Option<S>, open: Option<S>) -> Self {
        Self { closed, open }
    }

    /// Correction for an estimate of `current`, if any
    ///
    /// Both switches asserted at once is a wiring fault and yields no
    /// correction, even though the closed rule would otherwise match first.
    pub fn check(&mut self, current: u8) -> Result<Option<Correction>, S::Error> {
        let mut closed = Reading::new(self.closed.as_mut());
        let mut open = Reading::new(self.open.as_mut());

        if current != 0 && closed.is_asserted()? {
            if open.is_asserted()? {
                return Ok(None);
            }
            return Ok(Some(Correction::Closed));
        }

        if current != 100 && open.is_asserted()? {
            if closed.is_asserted()? {
                return Ok(None);
            }
            return Ok(Some(Correction::Open));
        }

        if (current == 0 && closed.is_released()?) || (current == 100 && open.is_released()?) {
            return Ok(Some(Correction::Midway));
        }

        Ok(None)
    }
}
