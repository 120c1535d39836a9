//! Position persistence
//!
//! Reads each blind's last known position out of flash before the blind
//! tasks start. Anything missing or unreadable comes back as `None`, which
//! the position model treats as fully closed.

use defmt::*;

use jalousie_core::config::{BlindsConfig, MAX_BLINDS};
use jalousie_hal::{decode_position, FlashError, POSITION_VALUE_LEN};
use jalousie_hal_rp2040::{FlashStorageTrait, StorageKey};

/// Restored value per blind index
pub type RestoredPositions = [Option<i32>; MAX_BLINDS];

/// Read back the stored position of every configured blind
pub async fn load_positions<F: FlashStorageTrait>(
    storage: &mut F,
    blinds: &BlindsConfig,
) -> RestoredPositions {
    let mut restored = [None; MAX_BLINDS];

    for (slot, blind) in restored.iter_mut().zip(blinds.blinds.iter()) {
        let name = blind.name.as_str();
        let Some(key) = StorageKey::position(name) else {
            warn!("[{}] name unusable as storage key", name);
            continue;
        };

        match load_one(storage, &key).await {
            Ok(value) => {
                debug!("[{}] restored position {}", name, value);
                *slot = Some(value);
            }
            Err(FlashError::NotFound) => {
                info!("[{}] no stored position, assuming closed", name);
            }
            Err(e) => {
                warn!("[{}] failed to read stored position: {:?}", name, e);
            }
        }
    }

    restored
}

async fn load_one<F: FlashStorageTrait>(storage: &mut F, key: &StorageKey) -> Result<i32, FlashError> {
    let mut buf = [0u8; POSITION_VALUE_LEN];
    let len = storage.read(key, &mut buf).await?;
    decode_position(&buf[..len])
}
