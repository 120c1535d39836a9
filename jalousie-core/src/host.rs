//! Host line protocol
//!
//! Newline-terminated ASCII over the serial link to the home-automation
//! bridge. One request per line, one reply per request, plus unsolicited
//! event lines whenever a blind's position or motion state changes.
//!
//! ```text
//! > get living target
//! < ok living target 40
//! > set living 80
//! < ok living target 80
//! < evt living state increasing
//! < evt living position 41
//! > set living 180
//! < err out-of-range
//! ```

use core::fmt::Write;

use heapless::String;

use crate::config::{validate_name, MAX_NAME_LEN};
use crate::motion::MotionState;
use crate::position::MAX_POSITION;

/// Longest line either direction, without the terminator
pub const MAX_LINE_LEN: usize = 64;

/// One protocol line
pub type Line = String<MAX_LINE_LEN>;

/// Malformed or unserviceable host request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Blank line
    Empty,
    /// First word not `get` or `set`
    UnknownCommand,
    /// Too few words
    MissingArgument,
    /// Too many words
    UnexpectedArgument,
    /// Unknown `get` field
    UnknownField,
    /// Name not a valid blind name
    InvalidName,
    /// No blind with that name
    UnknownBlind,
    /// Position is not a number
    InvalidPosition,
    /// Position above 100
    OutOfRange,
    /// Line longer than `MAX_LINE_LEN`
    TooLong,
    /// Blind task not accepting requests
    Busy,
}

impl CommandError {
    /// Reason word sent after `err`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::UnknownCommand => "unknown-command",
            Self::MissingArgument => "missing-argument",
            Self::UnexpectedArgument => "unexpected-argument",
            Self::UnknownField => "unknown-field",
            Self::InvalidName => "invalid-name",
            Self::UnknownBlind => "unknown-blind",
            Self::InvalidPosition => "invalid-position",
            Self::OutOfRange => "out-of-range",
            Self::TooLong => "too-long",
            Self::Busy => "busy",
        }
    }
}

/// Field read by `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Query {
    Current,
    Target,
    State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Get(Query),
    /// Move to a position (already range-checked)
    Set(u8),
}

/// A parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostRequest {
    pub name: String<MAX_NAME_LEN>,
    pub command: Command,
}

/// Successful reply payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Current(u8),
    Target(u8),
    State(MotionState),
}

/// Unsolicited change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    Position(u8),
    State(MotionState),
}

/// Parse one request line (terminator optional)
pub fn parse_request(line: &str) -> Result<HostRequest, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() > MAX_LINE_LEN {
        return Err(CommandError::TooLong);
    }

    let mut words = line.split_ascii_whitespace();
    let verb = words.next().ok_or(CommandError::Empty)?;
    if verb != "get" && verb != "set" {
        return Err(CommandError::UnknownCommand);
    }

    let name = words.next().ok_or(CommandError::MissingArgument)?;
    validate_name(name).map_err(|_| CommandError::InvalidName)?;
    let name = String::try_from(name).map_err(|_| CommandError::InvalidName)?;

    let arg = words.next().ok_or(CommandError::MissingArgument)?;
    if words.next().is_some() {
        return Err(CommandError::UnexpectedArgument);
    }

    let command = if verb == "get" {
        Command::Get(match arg {
            "current" => Query::Current,
            "target" => Query::Target,
            "state" => Query::State,
            _ => return Err(CommandError::UnknownField),
        })
    } else {
        Command::Set(parse_position(arg)?)
    };

    Ok(HostRequest { name, command })
}

fn parse_position(arg: &str) -> Result<u8, CommandError> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::InvalidPosition);
    }
    // Digits only, so a parse failure is an overflow
    let value: u32 = arg.parse().map_err(|_| CommandError::OutOfRange)?;
    if value > u32::from(MAX_POSITION) {
        return Err(CommandError::OutOfRange);
    }
    Ok(value as u8)
}

/// `ok <name> <field> <value>`
pub fn format_response(name: &str, response: Response) -> Line {
    let mut line = Line::new();
    let _ = match response {
        Response::Current(p) => write!(line, "ok {} current {}", name, p),
        Response::Target(p) => write!(line, "ok {} target {}", name, p),
        Response::State(s) => write!(line, "ok {} state {}", name, s.as_str()),
    };
    line
}

/// `evt <name> <field> <value>`
pub fn format_notification(name: &str, notification: Notification) -> Line {
    let mut line = Line::new();
    let _ = match notification {
        Notification::Position(p) => write!(line, "evt {} position {}", name, p),
        Notification::State(s) => write!(line, "evt {} state {}", name, s.as_str()),
    };
    line
}

/// `err <reason>`
pub fn format_error(error: CommandError) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "err {}", error.as_str());
    line
}

/// Splits the inbound byte stream into request lines
///
/// `\r` is dropped, blank lines are skipped and non-ASCII bytes become `?`.
/// An overlong line is discarded up to its terminator and reported once.
#[derive(Debug, Default)]
pub struct LineReader {
    line: Line,
    overflow: bool,
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            line: Line::new(),
            overflow: false,
        }
    }

    /// Feed one byte, returning a line once its terminator arrives
    pub fn feed(&mut self, byte: u8) -> Option<Result<Line, CommandError>> {
        match byte {
            b'\n' => {
                let line = core::mem::take(&mut self.line);
                if core::mem::take(&mut self.overflow) {
                    Some(Err(CommandError::TooLong))
                } else if line.trim().is_empty() {
                    None
                } else {
                    Some(Ok(line))
                }
            }
            b'\r' => None,
            _ if self.overflow => None,
            _ => {
                let c = if byte.is_ascii() { byte as char } else { '?' };
                if self.line.push(c).is_err() {
                    self.line.clear();
                    self.overflow = true;
                }
                None
            }
        }
    }
}
