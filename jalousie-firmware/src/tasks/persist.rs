//! Position persistence task
//!
//! Writes each blind's latest position to flash. Updates arriving during a
//! motion are coalesced so that a full travel costs a handful of writes
//! rather than one per percent.

use defmt::*;
use embassy_time::{Duration, Timer};

use jalousie_core::config::BlindsConfig;
use jalousie_hal::encode_position;
use jalousie_hal_rp2040::flash::Rp2040FlashStorage;
use jalousie_hal_rp2040::{FlashStorageTrait, StorageKey};

use crate::channels::{PERSIST_PENDING, POSITION_WRITES};

/// Quiet time collected before each flush
const SETTLE_TIME: Duration = Duration::from_millis(250);

/// Persist task - owns the flash and drains `POSITION_WRITES`
#[embassy_executor::task]
pub async fn persist_task(mut storage: Rp2040FlashStorage<'static>, blinds: &'static BlindsConfig) {
    info!("Persist task started");

    loop {
        PERSIST_PENDING.wait().await;
        Timer::after(SETTLE_TIME).await;

        for (index, blind) in blinds.blinds.iter().enumerate() {
            let Some(position) = POSITION_WRITES[index].try_take() else {
                continue;
            };
            let Some(key) = StorageKey::position(&blind.name) else {
                continue;
            };

            match storage.write(&key, &encode_position(position as i32)).await {
                Ok(()) => trace!("[{}] stored position {}", blind.name.as_str(), position),
                Err(e) => warn!("[{}] failed to store position: {:?}", blind.name.as_str(), e),
            }
        }
    }
}
