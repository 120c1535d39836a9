//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage in the last
//! 16KB of flash. Each blind's position is one map item keyed by its name,
//! so a position change costs one small append rather than a sector erase.
//!
//! Implements the `FlashStorage` trait from `jalousie-hal`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use jalousie_hal::flash::{FlashError, StorageKey};

/// Flash storage layout
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const STATE_PARTITION_SIZE: usize = 4 * ERASE_SIZE;
pub const STATE_PARTITION_START: usize = FLASH_SIZE - STATE_PARTITION_SIZE;

/// Flash range for the state partition
pub const STATE_RANGE: core::ops::Range<u32> = (STATE_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch size for one map item (length-prefixed key plus value)
const ITEM_BUFFER_SIZE: usize = 64;

/// RP2040 Flash storage implementation
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl<'d> jalousie_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: &StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STATE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(sequential_storage::Error::Corrupted { .. }) => Err(FlashError::Corrupted),
            Err(_) => Err(FlashError::Storage),
        }
    }

    async fn write(&mut self, key: &StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            STATE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            key,
            &data,
        )
        .await
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => FlashError::Full,
            sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
            sequential_storage::Error::Storage { .. } => FlashError::Flash,
            _ => FlashError::Storage,
        })
    }

    async fn exists(&mut self, key: &StorageKey) -> bool {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        matches!(
            map::fetch_item::<StorageKey, &[u8], _>(
                &mut self.flash,
                STATE_RANGE,
                &mut NoCache::new(),
                &mut data_buffer,
                key,
            )
            .await,
            Ok(Some(_))
        )
    }
}
