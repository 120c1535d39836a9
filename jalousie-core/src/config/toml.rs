//! Minimal TOML parser for blind configuration
//!
//! Handles only the subset used by `blinds.toml`. It does NOT support the
//! full TOML grammar; the build script validates the file with a real parser
//! before it is embedded, so this only has to cope with well-formed input.
//!
//! Supported:
//! - `[blind.<id>]` section headers
//! - `key = value` pairs (string, integer, boolean)
//! - Pins as integers (`pinUp = 2`) or strings (`pinUp = "gpio2"`)
//! - Comments (`# ...`), full-line and trailing
//!
//! NOT supported: arrays, inline tables, multi-line strings, dotted keys.

use heapless::String;

use super::types::{BlindConfig, BlindsConfig, ConfigError, RawBlindConfig, MAX_NAME_LEN, MAX_PIN};

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Malformed or unknown section header
    InvalidSection,
    /// Key outside a section or not a blind option
    UnknownKey,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Value of the wrong type
    InvalidValue,
    /// Pin value not a GPIO number
    InvalidPin,
    /// Section parsed but failed validation
    Config(ConfigError),
}

/// Parse failure with the 1-based line it was detected on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn at(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Section being filled
struct Pending {
    id: String<MAX_NAME_LEN>,
    raw: RawBlindConfig,
}

/// Parse `blinds.toml` into validated blind configs
pub fn parse_config(input: &str) -> Result<BlindsConfig, ParseError> {
    let mut config = BlindsConfig::new();
    let mut pending: Option<Pending> = None;
    let mut line_no = 0;

    for line in input.lines() {
        line_no += 1;
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ParseError::at(line_no, ParseErrorKind::InvalidSection));
            }
            save_section(&mut config, pending.take(), line_no)?;

            let id = parse_section_header(&line[1..line.len() - 1])
                .ok_or(ParseError::at(line_no, ParseErrorKind::InvalidSection))?;
            pending = Some(Pending {
                id,
                raw: RawBlindConfig::default(),
            });
            continue;
        }

        let (key, value) =
            parse_key_value(line).ok_or(ParseError::at(line_no, ParseErrorKind::InvalidLine))?;
        let section = pending
            .as_mut()
            .ok_or(ParseError::at(line_no, ParseErrorKind::UnknownKey))?;
        apply_value(&mut section.raw, key, value).map_err(|kind| ParseError::at(line_no, kind))?;
    }

    save_section(&mut config, pending.take(), line_no)?;
    Ok(config)
}

/// Validate a finished section and add it
fn save_section(
    config: &mut BlindsConfig,
    pending: Option<Pending>,
    line_no: usize,
) -> Result<(), ParseError> {
    let Some(section) = pending else {
        return Ok(());
    };

    let blind = BlindConfig::from_raw(&section.raw, Some(section.id.as_str()))
        .map_err(|e| ParseError::at(line_no, ParseErrorKind::Config(e)))?;
    config
        .push(blind)
        .map_err(|e| ParseError::at(line_no, ParseErrorKind::Config(e)))
}

/// "blind.living" -> "living"
fn parse_section_header(header: &str) -> Option<String<MAX_NAME_LEN>> {
    let (kind, id) = header.trim().split_once('.')?;
    if kind.trim() != "blind" {
        return None;
    }
    let id = id.trim();
    let id = id
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(id);
    if id.is_empty() || id.contains('.') {
        return None;
    }
    String::try_from(id).ok()
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value"
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn apply_value(raw: &mut RawBlindConfig, key: &str, value: &str) -> Result<(), ParseErrorKind> {
    match key {
        "name" => {
            let name = parse_string(value)?;
            raw.name = Some(String::try_from(name).map_err(|_| ParseErrorKind::InvalidValue)?);
        }
        "pinUp" => raw.pin_up = Some(parse_pin(value)?),
        "pinDown" => raw.pin_down = Some(parse_pin(value)?),
        "pinClosed" => raw.pin_closed = Some(parse_pin(value)?),
        "pinOpen" => raw.pin_open = Some(parse_pin(value)?),
        "durationUp" => raw.duration_up = Some(parse_int(value)?),
        "durationDown" => raw.duration_down = Some(parse_int(value)?),
        "activeLow" => raw.active_low = Some(parse_bool(value)?),
        "reedSwitchActiveLow" => raw.reed_switch_active_low = Some(parse_bool(value)?),
        _ => return Err(ParseErrorKind::UnknownKey),
    }
    Ok(())
}

/// Quoted string value
fn parse_string(value: &str) -> Result<&str, ParseErrorKind> {
    value
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(ParseErrorKind::InvalidValue)
}

/// Integer value, `_` separators allowed
fn parse_int(value: &str) -> Result<u32, ParseErrorKind> {
    let mut digits: String<16> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseErrorKind::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Pin as `2`, `"2"`, `"gpio2"` or `"GPIO2"`
fn parse_pin(value: &str) -> Result<u8, ParseErrorKind> {
    let s = parse_string(value).unwrap_or(value);
    let s = s
        .strip_prefix("gpio")
        .or_else(|| s.strip_prefix("GPIO"))
        .unwrap_or(s);

    let pin: u8 = s.parse().map_err(|_| ParseErrorKind::InvalidPin)?;
    if pin > MAX_PIN {
        return Err(ParseErrorKind::InvalidPin);
    }
    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PinRole, Polarity};
    use crate::motion::Direction;

    #[test]
    fn test_parse_pin() {
        assert_eq!(parse_pin("11"), Ok(11));
        assert_eq!(parse_pin("\"gpio12\""), Ok(12));
        assert_eq!(parse_pin("\"GPIO4\""), Ok(4));
        assert_eq!(parse_pin("\"7\""), Ok(7));
        assert_eq!(parse_pin("30"), Err(ParseErrorKind::InvalidPin));
        assert_eq!(parse_pin("\"pin5\""), Err(ParseErrorKind::InvalidPin));
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("blind.living").unwrap().as_str(), "living");
        assert_eq!(parse_section_header(" blind.\"bed\" ").unwrap().as_str(), "bed");
        assert!(parse_section_header("blind").is_none());
        assert!(parse_section_header("stepper.spin").is_none());
        assert!(parse_section_header("blind.a.b").is_none());
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("pinUp = 2 # relay 1"), "pinUp = 2 ");
        assert_eq!(strip_comment("name = \"a#b\""), "name = \"a#b\"");
        assert_eq!(strip_comment("# whole line"), "");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
# Living room
[blind.living]
pinUp = 2
pinDown = 3
pinClosed = 4
durationUp = 12_000
durationDown = 11000

[blind.bedroom]
name = "bed"
pinUp = "gpio6"
pinDown = "gpio7"
pinOpen = 8
durationUp = 9000
durationDown = 9000
activeLow = false
reedSwitchActiveLow = false
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.blinds.len(), 2);

        let living = &config.blinds[0];
        assert_eq!(living.name.as_str(), "living");
        assert_eq!(living.pin_closed, Some(4));
        assert_eq!(living.pin_open, None);
        assert_eq!(living.calibration.duration_up_ms, 12000);
        assert_eq!(living.line_polarity, Polarity::ActiveLow);

        let bed = &config.blinds[1];
        assert_eq!(bed.name.as_str(), "bed");
        assert_eq!(bed.pin_up, 6);
        assert_eq!(bed.pin_open, Some(8));
        assert_eq!(bed.line_polarity, Polarity::ActiveHigh);
        assert_eq!(bed.sensor_polarity, Polarity::ActiveHigh);
        assert_eq!(config.find("bed"), Some(1));
    }

    #[test]
    fn test_missing_duration_reported() {
        let config_str = "[blind.a]\npinUp = 2\npinDown = 3\ndurationUp = 100\n";
        let err = parse_config(config_str).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Config(ConfigError::MissingDuration(Direction::Down))
        );
    }

    #[test]
    fn test_duplicate_pin_reported() {
        let config_str = "[blind.a]\npinUp = 2\npinDown = 2\ndurationUp = 1\ndurationDown = 1\n";
        let err = parse_config(config_str).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Config(ConfigError::DuplicatePin(2)));
    }

    #[test]
    fn test_unknown_key() {
        let err = parse_config("[blind.a]\npinUpp = 2\n").unwrap_err();
        assert_eq!(err, ParseError::at(2, ParseErrorKind::UnknownKey));

        let err = parse_config("pinUp = 2\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownKey);
    }

    #[test]
    fn test_bad_values() {
        let err = parse_config("[blind.a]\nactiveLow = yes\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);

        let err = parse_config("[blind.a]\ndurationUp = -5\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);

        let err = parse_config("[blind.a]\nname = living\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);

        let err = parse_config("[blind.a]\npinUp\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidLine);
    }

    #[test]
    fn test_too_many_blinds() {
        let mut input = std::string::String::new();
        for i in 0..5 {
            input.push_str(&std::format!(
                "[blind.b{i}]\npinUp = {}\npinDown = {}\ndurationUp = 1000\ndurationDown = 1000\n",
                2 * i,
                2 * i + 1
            ));
        }
        let err = parse_config(&input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Config(ConfigError::TooManyBlinds));
    }

    #[test]
    fn test_missing_pin_role() {
        let err = parse_config("[blind.a]\npinDown = 3\ndurationUp = 1\ndurationDown = 1\n")
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Config(ConfigError::MissingPin(PinRole::Up)));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_config("").unwrap().blinds.is_empty());
    }

    #[test]
    fn test_firmware_config_parses() {
        let config = parse_config(include_str!("../../../jalousie-firmware/blinds.toml")).unwrap();
        assert_eq!(config.blinds.len(), 3);

        let living = &config.blinds[0];
        assert_eq!(living.name.as_str(), "living");
        assert_eq!(living.pin_open, Some(5));
        assert_eq!(living.calibration.duration_up_ms, 21500);

        let bedroom = &config.blinds[config.find("bedroom").unwrap()];
        assert_eq!(bedroom.pin_closed, Some(10));
        assert_eq!(bedroom.line_polarity, Polarity::ActiveHigh);
        assert_eq!(bedroom.sensor_polarity, Polarity::ActiveLow);
    }
}
