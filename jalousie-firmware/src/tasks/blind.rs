//! Per-blind control loop
//!
//! Owns one `BlindController` and is the only code that touches its relay
//! and reed-switch lines. Sleeps until either a host request arrives or the
//! controller's next tick or deadline is due.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Instant, Timer};

use jalousie_core::config::MAX_BLINDS;
use jalousie_core::host::{format_error, format_response, Command, CommandError, Query, Response};
use jalousie_core::motion::Request;
use jalousie_core::BlindController;
use jalousie_drivers::{DriverError, ReedSwitch, RelayLines};

use crate::channels::{BLIND_REQUESTS, OUTBOX};
use crate::store::{EventSink, QueuedStore};

/// Controller type for one relay-driven blind on the RP2040
pub type Blind = BlindController<
    RelayLines<Output<'static>, Output<'static>>,
    ReedSwitch<Input<'static>>,
    QueuedStore,
    EventSink,
>;

type LineError = DriverError<core::convert::Infallible>;

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Blind task - drives one covering and answers its host requests
#[embassy_executor::task(pool_size = MAX_BLINDS)]
pub async fn blind_task(index: usize, mut blind: Blind) {
    info!(
        "[{}] blind task started at {}%",
        blind.name(),
        blind.current_position()
    );

    let requests = &BLIND_REQUESTS[index];

    loop {
        let wakeup = match blind.next_wakeup() {
            Some(at) => Instant::from_millis(at),
            None => Instant::MAX,
        };

        let result = match select(requests.receive(), Timer::at(wakeup)).await {
            Either::First(command) => {
                // Catch up on anything that fell due while the request queued
                match blind.poll(now_ms()) {
                    Ok(_) => handle_command(&mut blind, command),
                    Err(e) => Err(e),
                }
            }
            Either::Second(()) => blind.poll(now_ms()).map(|finished| {
                if finished {
                    debug!("[{}] pulse finished at {}%", blind.name(), blind.current_position());
                }
            }),
        };

        if let Err(e) = result {
            error!("[{}] line I/O failed, stopping: {:?}", blind.name(), e);
            if let Err(e) = blind.halt() {
                error!("[{}] failed to release lines: {:?}", blind.name(), e);
            }
            break;
        }
    }

    // Keep the controller, and with it the released pins, alive
    loop {
        requests.receive().await;
        warn!("[{}] request refused, blind stopped after a line fault", blind.name());
        OUTBOX.send(format_error(CommandError::Busy)).await;
    }
}

fn handle_command(blind: &mut Blind, command: Command) -> Result<(), LineError> {
    let response = match command {
        Command::Get(Query::Current) => Response::Current(blind.current_position()),
        Command::Get(Query::Target) => {
            let reading = blind.get_target_position()?;
            if let Some(correction) = reading.correction {
                info!("[{}] end stop correction: {:?}", blind.name(), correction);
            }
            Response::Target(reading.position)
        }
        Command::Get(Query::State) => Response::State(blind.motion_state()),
        Command::Set(position) => {
            match blind.set_target_position(position, now_ms())? {
                Request::Unchanged => {
                    debug!("[{}] already at {}%", blind.name(), position);
                }
                Request::Moving(plan) => {
                    info!(
                        "[{}] moving {:?} to {}% for {} ms{}",
                        blind.name(),
                        plan.direction,
                        position,
                        plan.duration_ms,
                        if plan.reversed { " (reversed)" } else { "" }
                    );
                }
            }
            Response::Target(position)
        }
    };

    // Never wait on the UART here: a due deadline must not be held up
    if OUTBOX.try_send(format_response(blind.name(), response)).is_err() {
        warn!("[{}] host outbox full, dropping reply {:?}", blind.name(), response);
    }
    Ok(())
}
