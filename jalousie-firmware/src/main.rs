//! Jalousie - Window Covering Controller Firmware
//!
//! Main firmware binary for RP2040 boards switching blind motors through a
//! pair of relays. Position is estimated from travel time, corrected by
//! optional reed switches at the end stops, and reported to a home
//! automation bridge over UART0.

#![no_std]
#![no_main]

use core::convert::Infallible;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use jalousie_core::config::{parse_config, BlindConfig, BlindsConfig, ConfigError, Polarity};
use jalousie_core::{BlindController, BlindError};
use jalousie_drivers::{DriverError, ReedSwitch, RelayLines};
use jalousie_hal_rp2040::flash::Rp2040FlashStorage;
use jalousie_hal_rp2040::pins::{PinBank, PinError};

use crate::config::load_positions;
use crate::store::{EventSink, QueuedStore};
use crate::tasks::Blind;

/// Embedded blind configuration (compiled into firmware)
/// Edit blinds.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../blinds.toml");

mod channels;
mod config;
mod store;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Shared by the host RX and persist tasks
static BLINDS: StaticCell<BlindsConfig> = StaticCell::new();

/// Reasons a configured blind is left out at boot
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum BootError {
    Pin(PinError),
    Config(ConfigError),
    Line(DriverError<Infallible>),
}

impl From<PinError> for BootError {
    fn from(e: PinError) -> Self {
        BootError::Pin(e)
    }
}

impl From<BlindError<DriverError<Infallible>>> for BootError {
    fn from(e: BlindError<DriverError<Infallible>>) -> Self {
        match e {
            BlindError::Config(e) => BootError::Config(e),
            BlindError::Io(e) => BootError::Line(e),
        }
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Jalousie firmware starting...");

    let p = embassy_rp::init(Default::default());
    let (mut bank, rest) = PinBank::split(p);
    info!("Peripherals initialized");

    let blinds = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("blinds.toml line {}: {:?}", e.line, e.kind);
            BlindsConfig::new()
        }
    };
    let blinds: &'static BlindsConfig = BLINDS.init(blinds);
    info!("Configuration loaded: {} blind(s)", blinds.blinds.len());

    // Host link on UART0
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart_config = UartConfig::default(); // 115200 baud default
    let uart = Uart::new_blocking(rest.uart0, rest.uart_tx, rest.uart_rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // Positions are read before any blind task can queue a write
    let mut storage = Rp2040FlashStorage::new(rest.flash, rest.dma_ch0);
    let restored = load_positions(&mut storage, blinds).await;

    let mut started = 0;
    for (index, config) in blinds.blinds.iter().enumerate() {
        match build_blind(index, config, &mut bank, restored[index]) {
            Ok(blind) => {
                spawner.spawn(tasks::blind_task(index, blind)).unwrap();
                started += 1;
            }
            Err(e) => {
                error!("[{}] not started: {:?}", config.name.as_str(), e);
            }
        }
    }

    spawner.spawn(tasks::persist_task(storage, blinds)).unwrap();
    spawner.spawn(tasks::host_tx_task(tx)).unwrap();
    spawner.spawn(tasks::host_rx_task(rx, blinds)).unwrap();

    info!("All tasks spawned, {} blind(s) running", started);
}

/// Claim the pins of one blind and wrap them in a controller
fn build_blind(
    index: usize,
    config: &BlindConfig,
    bank: &mut PinBank,
    restored: Option<i32>,
) -> Result<Blind, BootError> {
    bank.check_all(config.pins().map(|(_, pin)| pin))?;

    let idle = Level::from(config.line_polarity.idle_high());
    let up = bank.take_output(config.pin_up, idle)?;
    let down = bank.take_output(config.pin_down, idle)?;
    let lines = RelayLines::new(up, down, config.line_polarity).map_err(BootError::Line)?;

    let pull = match config.sensor_polarity {
        Polarity::ActiveLow => Pull::Up,
        Polarity::ActiveHigh => Pull::Down,
    };
    let closed = match config.pin_closed {
        Some(pin) => Some(ReedSwitch::new(bank.take_input(pin, pull)?, config.sensor_polarity)),
        None => None,
    };
    let open = match config.pin_open {
        Some(pin) => Some(ReedSwitch::new(bank.take_input(pin, pull)?, config.sensor_polarity)),
        None => None,
    };

    let blind = BlindController::new(
        config,
        lines,
        closed,
        open,
        QueuedStore::new(index, restored),
        EventSink::new(config.name.clone()),
    )?;

    info!(
        "[{}] up=GPIO{} down=GPIO{} travel {}/{} ms, at {}%",
        config.name.as_str(),
        config.pin_up,
        config.pin_down,
        config.calibration.duration_up_ms,
        config.calibration.duration_down_ms,
        blind.current_position()
    );
    Ok(blind)
}
