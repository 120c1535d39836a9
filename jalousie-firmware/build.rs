//! Build script for jalousie-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates blinds.toml at compile time

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `jalousie_core::config::MAX_BLINDS`
const MAX_BLINDS: usize = 4;

/// Must match `jalousie_core::config::MAX_NAME_LEN`
const MAX_NAME_LEN: usize = 24;

/// Highest RP2040 GPIO number
const MAX_PIN: i64 = 29;

/// GPIOs reserved for the host UART
const RESERVED_PINS: [i64; 2] = [0, 1];

const PIN_KEYS: [&str; 4] = ["pinUp", "pinDown", "pinClosed", "pinOpen"];
const DURATION_KEYS: [&str; 2] = ["durationUp", "durationDown"];
const FLAG_KEYS: [&str; 2] = ["activeLow", "reedSwitchActiveLow"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Validate blinds.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=blinds.toml");

    let config_path = Path::new("blinds.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: blinds.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a blinds.toml configuration file.         ║\n\
            ║  Please create one in the jalousie-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read blinds.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in blinds.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let errors = validate_blinds(&config);
    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid blind configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=blinds.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pin values may be written as `4`, `"4"` or `"gpio4"`
fn pin_number(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::String(s) => {
            let lower = s.to_ascii_lowercase();
            lower.strip_prefix("gpio").unwrap_or(&lower).parse().ok()
        }
        _ => None,
    }
}

/// Collect every problem in the `[blind.*]` tables
fn validate_blinds(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();

    let top = match config.as_table() {
        Some(t) => t,
        None => return errors,
    };
    for key in top.keys() {
        if key != "blind" {
            errors.push(format!("unknown section [{}]", key));
        }
    }

    let blinds = match config.get("blind") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[blind] must contain [blind.<id>] tables".to_string());
            return errors;
        }
        None => {
            errors.push("missing [blind.*] section - at least one blind is required".to_string());
            return errors;
        }
    };

    if blinds.is_empty() {
        errors.push("at least one [blind.<id>] table is required".to_string());
    }
    if blinds.len() > MAX_BLINDS {
        errors.push(format!("at most {} blinds are supported", MAX_BLINDS));
    }

    let mut names = BTreeSet::new();
    let mut pin_owners: BTreeMap<i64, String> = BTreeMap::new();

    for (id, blind) in blinds {
        let blind = match blind {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[blind.{}] must be a table", id));
                continue;
            }
        };

        for key in blind.keys() {
            let known = key == "name"
                || PIN_KEYS.contains(&key.as_str())
                || DURATION_KEYS.contains(&key.as_str())
                || FLAG_KEYS.contains(&key.as_str());
            if !known {
                errors.push(format!("[blind.{}] unknown key '{}'", id, key));
            }
        }

        // Name defaults to the section id
        let name = match blind.get("name") {
            Some(toml::Value::String(n)) => n.clone(),
            Some(_) => {
                errors.push(format!("[blind.{}] name must be a string", id));
                id.clone()
            }
            None => id.clone(),
        };
        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || !name.bytes().all(|b| b.is_ascii_graphic())
        {
            errors.push(format!(
                "[blind.{}] name must be 1-{} ASCII chars, no spaces",
                id, MAX_NAME_LEN
            ));
        }
        if !names.insert(name.clone()) {
            errors.push(format!("[blind.{}] duplicate name '{}'", id, name));
        }

        let mut own_pins = BTreeSet::new();
        for key in PIN_KEYS {
            let value = match blind.get(key) {
                Some(v) => v,
                None => {
                    if key == "pinUp" || key == "pinDown" {
                        errors.push(format!("[blind.{}] missing '{}'", id, key));
                    }
                    continue;
                }
            };
            let pin = match pin_number(value) {
                Some(p) if (0..=MAX_PIN).contains(&p) => p,
                _ => {
                    errors.push(format!("[blind.{}] {} must be GPIO 0-{}", id, key, MAX_PIN));
                    continue;
                }
            };
            if RESERVED_PINS.contains(&pin) {
                errors.push(format!("[blind.{}] {} uses GPIO{} (host UART)", id, key, pin));
            }
            if !own_pins.insert(pin) {
                errors.push(format!("[blind.{}] GPIO{} used twice", id, pin));
            } else if let Some(owner) = pin_owners.insert(pin, id.clone()) {
                errors.push(format!("[blind.{}] GPIO{} already used by {}", id, pin, owner));
            }
        }

        for key in DURATION_KEYS {
            match blind.get(key) {
                Some(toml::Value::Integer(ms)) if *ms > 0 && *ms <= u32::MAX as i64 => {}
                Some(toml::Value::Integer(_)) => {
                    errors.push(format!("[blind.{}] {} must be a positive ms count", id, key));
                }
                Some(_) => errors.push(format!("[blind.{}] {} must be an integer", id, key)),
                None => errors.push(format!("[blind.{}] missing '{}'", id, key)),
            }
        }

        for key in FLAG_KEYS {
            if let Some(value) = blind.get(key) {
                if !value.is_bool() {
                    errors.push(format!("[blind.{}] {} must be true or false", id, key));
                }
            }
        }
    }

    errors
}
