//! Host UART receive task
//!
//! Assembles request lines from the serial link and routes each one to the
//! task that owns the named blind. Errors are answered directly.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use jalousie_core::config::BlindsConfig;
use jalousie_core::host::{format_error, parse_request, CommandError, LineReader};

use crate::channels::{BLIND_REQUESTS, OUTBOX};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Host RX task - parses request lines and dispatches them
#[embassy_executor::task]
pub async fn host_rx_task(mut rx: BufferedUartRx, blinds: &'static BlindsConfig) {
    info!("Host RX task started");

    let mut reader = LineReader::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    let Some(line) = reader.feed(byte) else {
                        continue;
                    };
                    let routed = line.and_then(|line| dispatch(&line, blinds));
                    if let Err(e) = routed {
                        debug!("Rejected host line: {:?}", e);
                        OUTBOX.send(format_error(e)).await;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Host RX error: {:?}", e);
            }
        }
    }
}

/// Hand a parsed request to its blind task
fn dispatch(line: &str, blinds: &BlindsConfig) -> Result<(), CommandError> {
    let request = parse_request(line)?;
    let index = blinds
        .find(&request.name)
        .ok_or(CommandError::UnknownBlind)?;

    trace!("[{}] request {:?}", request.name.as_str(), request.command);
    BLIND_REQUESTS[index]
        .try_send(request.command)
        .map_err(|_| CommandError::Busy)
}
