//! Dynamic pin allocation for config-driven hardware setup
//!
//! Relay and reed-switch GPIOs come from `blinds.toml`, so they are handed
//! out by number at runtime. GPIO0/GPIO1 carry the host UART and are kept
//! out of the bank.

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::peripherals;
use embassy_rp::{Peri, Peripherals};

/// Number of GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// UART0 TX, reserved for the host link
pub const UART_TX_PIN: u8 = 0;

/// UART0 RX, reserved for the host link
pub const UART_RX_PIN: u8 = 1;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
    /// Pin reserved for the host UART
    Reserved(u8),
}

/// Pin bank that holds the free GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Split the chip peripherals into the GPIO bank and everything else
    pub fn split(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            flash: p.FLASH,
            dma_ch0: p.DMA_CH0,
            uart0: p.UART0,
            uart_tx: p.PIN_0,
            uart_rx: p.PIN_1,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.check(pin_num)?;
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Check a pin can be taken without taking it
    pub fn check(&self, pin_num: u8) -> Result<(), PinError> {
        if pin_num == UART_TX_PIN || pin_num == UART_RX_PIN {
            return Err(PinError::Reserved(pin_num));
        }
        match self.pins.get(pin_num as usize) {
            None => Err(PinError::InvalidPin(pin_num)),
            Some(None) => Err(PinError::AlreadyTaken(pin_num)),
            Some(Some(_)) => Ok(()),
        }
    }

    /// Check a whole set of pins before taking any of them
    ///
    /// Catches a later pin of the set being unavailable before earlier ones
    /// have been consumed.
    pub fn check_all(&self, pins: impl IntoIterator<Item = u8>) -> Result<(), PinError> {
        pins.into_iter().try_for_each(|pin| self.check(pin))
    }

    /// Take a pin as a push-pull output starting at `initial`
    pub fn take_output(&mut self, pin_num: u8, initial: Level) -> Result<Output<'static>, PinError> {
        Ok(Output::new(self.take(pin_num)?, initial))
    }

    /// Take a pin as an input with the given pull
    pub fn take_input(&mut self, pin_num: u8, pull: Pull) -> Result<Input<'static>, PinError> {
        Ok(Input::new(self.take(pin_num)?, pull))
    }
}

/// Non-bank peripherals the firmware still needs
pub struct RemainingPeripherals {
    pub flash: Peri<'static, peripherals::FLASH>,
    pub dma_ch0: Peri<'static, peripherals::DMA_CH0>,
    pub uart0: Peri<'static, peripherals::UART0>,
    pub uart_tx: Peri<'static, peripherals::PIN_0>,
    pub uart_rx: Peri<'static, peripherals::PIN_1>,
}
