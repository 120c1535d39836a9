//! Flash storage abstractions
//!
//! Provides traits for persistent key-value storage that can be implemented
//! by chip-specific HALs using their flash memory.

use heapless::String;

/// Maximum length of a device name used as a storage key
pub const MAX_KEY_LEN: usize = 24;

/// Storage key for persisted data
///
/// Each blind persists its last known position under its device name. The
/// actual storage implementation handles wear leveling and data integrity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageKey {
    name: String<MAX_KEY_LEN>,
}

impl StorageKey {
    /// Create the key a device's position is stored under
    ///
    /// Returns `None` if the name is empty or longer than [`MAX_KEY_LEN`].
    pub fn position(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let mut key = String::new();
        key.push_str(name).ok()?;
        Some(Self { name: key })
    }

    /// The device name this key belongs to
    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    /// Encode as a length-prefixed byte string
    ///
    /// Returns the number of bytes written, or `None` if `buffer` is too small.
    pub fn encode(&self, buffer: &mut [u8]) -> Option<usize> {
        let bytes = self.name.as_bytes();
        let len = bytes.len() + 1;
        if buffer.len() < len {
            return None;
        }
        buffer[0] = bytes.len() as u8;
        buffer[1..len].copy_from_slice(bytes);
        Some(len)
    }

    /// Decode a length-prefixed key
    ///
    /// Returns the key and the number of bytes consumed.
    pub fn decode(buffer: &[u8]) -> Result<(Self, usize), KeyDecodeError> {
        let (&len, rest) = buffer.split_first().ok_or(KeyDecodeError::Truncated)?;
        let len = len as usize;
        if len == 0 || len > MAX_KEY_LEN {
            return Err(KeyDecodeError::InvalidLength);
        }
        let bytes = rest.get(..len).ok_or(KeyDecodeError::Truncated)?;
        let name = core::str::from_utf8(bytes).map_err(|_| KeyDecodeError::InvalidUtf8)?;
        let key = Self::position(name).ok_or(KeyDecodeError::InvalidLength)?;
        Ok((key, len + 1))
    }
}

/// Size of a stored position value
pub const POSITION_VALUE_LEN: usize = 4;

/// Encode a position as a little-endian `i32`
pub fn encode_position(value: i32) -> [u8; POSITION_VALUE_LEN] {
    value.to_le_bytes()
}

/// Decode a stored position; anything but exactly four bytes is corrupt
pub fn decode_position(data: &[u8]) -> Result<i32, FlashError> {
    let bytes: [u8; POSITION_VALUE_LEN] = data.try_into().map_err(|_| FlashError::Corrupted)?;
    Ok(i32::from_le_bytes(bytes))
}

/// Errors from decoding a stored key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyDecodeError {
    /// Buffer ended before the key did
    Truncated,
    /// Length prefix is zero or too large
    InvalidLength,
    /// Name is not valid UTF-8
    InvalidUtf8,
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Flash storage trait
///
/// Provides wear-leveled key-value storage for persisted state.
/// Implementations should handle:
/// - Wear leveling across flash sectors
/// - Data integrity (CRC or similar)
/// - Atomic writes where possible
pub trait FlashStorage {
    /// Read a value by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn read(
        &mut self,
        key: &StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write a value by key
    fn write(
        &mut self,
        key: &StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Check if a key exists in storage
    fn exists(&mut self, key: &StorageKey) -> impl core::future::Future<Output = bool>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        self.encode(buffer)
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        StorageKey::decode(buffer).map_err(|e| match e {
            KeyDecodeError::Truncated => sequential_storage::map::SerializationError::BufferTooSmall,
            _ => sequential_storage::map::SerializationError::InvalidFormat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key_rejects_bad_names() {
        assert!(StorageKey::position("").is_none());
        assert!(StorageKey::position("a-name-that-is-far-too-long-for-flash").is_none());
        assert_eq!(StorageKey::position("living").unwrap().as_str(), "living");
    }

    #[test]
    fn test_key_encoding() {
        let key = StorageKey::position("study").unwrap();
        let mut buf = [0u8; 32];
        let len = key.encode(&mut buf).unwrap();

        assert_eq!(len, 6);
        assert_eq!(&buf[..len], b"\x05study");

        let (decoded, used) = StorageKey::decode(&buf[..len]).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(used, len);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let key = StorageKey::position("kitchen").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(key.encode(&mut buf), None);
    }

    #[test]
    fn test_position_value_encoding() {
        assert_eq!(encode_position(37), [37, 0, 0, 0]);
        assert_eq!(decode_position(&[100, 0, 0, 0]), Ok(100));
        assert_eq!(decode_position(&encode_position(-1)), Ok(-1));
        assert_eq!(decode_position(&[1, 2, 3]), Err(FlashError::Corrupted));
        assert_eq!(decode_position(&[]), Err(FlashError::Corrupted));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(StorageKey::decode(&[]), Err(KeyDecodeError::Truncated));
        assert_eq!(StorageKey::decode(&[0]), Err(KeyDecodeError::InvalidLength));
        assert_eq!(StorageKey::decode(&[4, b'a', b'b']), Err(KeyDecodeError::Truncated));
        assert_eq!(
            StorageKey::decode(&[2, 0xff, 0xfe]),
            Err(KeyDecodeError::InvalidUtf8)
        );
    }
}
