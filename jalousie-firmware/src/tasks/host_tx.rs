//! Host UART transmit task
//!
//! Drains `OUTBOX` onto the wire, one line per entry.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::OUTBOX;

/// Host TX task - writes replies and event lines
#[embassy_executor::task]
pub async fn host_tx_task(mut tx: BufferedUartTx) {
    info!("Host TX task started");

    loop {
        let line = OUTBOX.receive().await;
        trace!("TX: {}", line.as_str());

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("Host TX error: {:?}", e);
            continue;
        }
        if let Err(e) = tx.write_all(b"\n").await {
            warn!("Host TX error: {:?}", e);
        }
    }
}
