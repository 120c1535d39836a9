//! Configuration type definitions
//!
//! A blind is described by a [`RawBlindConfig`] as it comes out of the
//! configuration file (every field optional), which is validated exactly once
//! into a [`BlindConfig`]. Nothing downstream ever sees a half-filled config.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::Direction;

/// Maximum blind name length (also the persistent storage key length)
pub const MAX_NAME_LEN: usize = 24;

/// Maximum blinds per board
pub const MAX_BLINDS: usize = 4;

/// Highest GPIO number accepted in a pin field
pub const MAX_PIN: u8 = 29;

/// Which logic level means "asserted"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    /// Asserted when the line is low
    #[default]
    ActiveLow,
    /// Asserted when the line is high
    ActiveHigh,
}

impl Polarity {
    /// Map an `activeLow`-style flag to a polarity
    pub const fn from_active_low(active_low: bool) -> Self {
        if active_low {
            Self::ActiveLow
        } else {
            Self::ActiveHigh
        }
    }

    /// Level (true = high) that asserts the line
    pub const fn active_high(self) -> bool {
        matches!(self, Self::ActiveHigh)
    }

    /// Level (true = high) that releases the line
    pub const fn idle_high(self) -> bool {
        !self.active_high()
    }
}

/// Full-travel timing for one blind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Time to travel from fully closed to fully open (ms)
    pub duration_up_ms: u32,
    /// Time to travel from fully open to fully closed (ms)
    pub duration_down_ms: u32,
}

impl Calibration {
    /// Full-range travel time for a direction
    pub const fn full_travel_ms(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Up => self.duration_up_ms,
            Direction::Down => self.duration_down_ms,
        }
    }

    /// Drive time to cover `distance` percent, rounded half away from zero
    pub fn drive_ms(&self, direction: Direction, distance: u8) -> u32 {
        let full = u64::from(self.full_travel_ms(direction));
        ((u64::from(distance) * full + 50) / 100) as u32
    }

    /// Time per one-percent tick, rounded, never below 1 ms
    pub fn tick_ms(&self, direction: Direction) -> u32 {
        let full = self.full_travel_ms(direction);
        (full.saturating_add(50) / 100).max(1)
    }
}

/// Pin roles within one blind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    Up,
    Down,
    Closed,
    Open,
}

/// Configuration rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No name and no section id to fall back on
    MissingName,
    /// Name too long, empty, non-ASCII or containing whitespace
    InvalidName,
    /// Required pin not given
    MissingPin(PinRole),
    /// Pin number out of range for the board
    InvalidPin(PinRole),
    /// Same GPIO used for two roles within one blind
    DuplicatePin(u8),
    /// Required travel duration not given
    MissingDuration(Direction),
    /// Travel duration of zero
    ZeroDuration(Direction),
    /// More blinds than `MAX_BLINDS`
    TooManyBlinds,
    /// Two blinds share a name (and therefore a storage key)
    DuplicateName,
}

/// Blind configuration as read from the file, before defaulting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawBlindConfig {
    pub name: Option<String<MAX_NAME_LEN>>,
    pub pin_up: Option<u8>,
    pub pin_down: Option<u8>,
    pub pin_closed: Option<u8>,
    pub pin_open: Option<u8>,
    pub duration_up: Option<u32>,
    pub duration_down: Option<u32>,
    pub active_low: Option<bool>,
    pub reed_switch_active_low: Option<bool>,
}

/// Validated blind configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlindConfig {
    /// Log tag, host protocol name and storage key
    pub name: String<MAX_NAME_LEN>,
    /// GPIO of the raise relay
    pub pin_up: u8,
    /// GPIO of the lower relay
    pub pin_down: u8,
    /// GPIO of the fully-closed reed switch
    pub pin_closed: Option<u8>,
    /// GPIO of the fully-open reed switch
    pub pin_open: Option<u8>,
    pub calibration: Calibration,
    /// Relay line polarity
    pub line_polarity: Polarity,
    /// Reed switch polarity
    pub sensor_polarity: Polarity,
}

impl BlindConfig {
    /// Build a config with the required fields and default polarities
    pub fn new(
        name: &str,
        pin_up: u8,
        pin_down: u8,
        duration_up_ms: u32,
        duration_down_ms: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            name: String::try_from(name).map_err(|_| ConfigError::InvalidName)?,
            pin_up,
            pin_down,
            pin_closed: None,
            pin_open: None,
            calibration: Calibration {
                duration_up_ms,
                duration_down_ms,
            },
            line_polarity: Polarity::ActiveLow,
            sensor_polarity: Polarity::ActiveLow,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply defaults to a raw config and validate it
    ///
    /// `fallback_name` is used when the raw config carries no name (the TOML
    /// section id).
    pub fn from_raw(raw: &RawBlindConfig, fallback_name: Option<&str>) -> Result<Self, ConfigError> {
        let name = match (&raw.name, fallback_name) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => String::try_from(id).map_err(|_| ConfigError::InvalidName)?,
            (None, None) => return Err(ConfigError::MissingName),
        };

        let config = Self {
            name,
            pin_up: raw.pin_up.ok_or(ConfigError::MissingPin(PinRole::Up))?,
            pin_down: raw.pin_down.ok_or(ConfigError::MissingPin(PinRole::Down))?,
            pin_closed: raw.pin_closed,
            pin_open: raw.pin_open,
            calibration: Calibration {
                duration_up_ms: raw
                    .duration_up
                    .ok_or(ConfigError::MissingDuration(Direction::Up))?,
                duration_down_ms: raw
                    .duration_down
                    .ok_or(ConfigError::MissingDuration(Direction::Down))?,
            },
            line_polarity: Polarity::from_active_low(raw.active_low.unwrap_or(true)),
            sensor_polarity: Polarity::from_active_low(raw.reed_switch_active_low.unwrap_or(true)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint on a config
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;

        if self.calibration.duration_up_ms == 0 {
            return Err(ConfigError::ZeroDuration(Direction::Up));
        }
        if self.calibration.duration_down_ms == 0 {
            return Err(ConfigError::ZeroDuration(Direction::Down));
        }

        let mut seen: Vec<u8, 4> = Vec::new();
        for (role, pin) in self.pins() {
            if pin > MAX_PIN {
                return Err(ConfigError::InvalidPin(role));
            }
            if seen.contains(&pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
            // At most four roles, capacity is four
            let _ = seen.push(pin);
        }

        Ok(())
    }

    /// All configured pins with their roles
    pub fn pins(&self) -> impl Iterator<Item = (PinRole, u8)> {
        [
            (PinRole::Up, Some(self.pin_up)),
            (PinRole::Down, Some(self.pin_down)),
            (PinRole::Closed, self.pin_closed),
            (PinRole::Open, self.pin_open),
        ]
        .into_iter()
        .filter_map(|(role, pin)| pin.map(|p| (role, p)))
    }
}

/// Names travel over the host line protocol as single tokens
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || !name.bytes().all(|b| b.is_ascii_graphic())
    {
        return Err(ConfigError::InvalidName);
    }
    Ok(())
}

/// All blinds on the board
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlindsConfig {
    pub blinds: Vec<BlindConfig, MAX_BLINDS>,
}

impl BlindsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated blind, rejecting duplicate names
    pub fn push(&mut self, blind: BlindConfig) -> Result<(), ConfigError> {
        if self.find(&blind.name).is_some() {
            return Err(ConfigError::DuplicateName);
        }
        self.blinds
            .push(blind)
            .map_err(|_| ConfigError::TooManyBlinds)
    }

    /// Find a blind index by name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.blinds.iter().position(|b| b.name.as_str() == name)
    }
}
