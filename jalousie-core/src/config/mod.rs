//! Configuration types
//!
//! Board-agnostic configuration structures, validated once when a blind is
//! constructed. The embedded `blinds.toml` is parsed by [`toml::parse_config`].

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError, ParseErrorKind};
pub use types::*;
