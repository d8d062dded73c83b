//! Protocol configuration and its TOML reader.
//!
//! The reader handles only the subset the firmware's `bringup.toml` needs.
//! It is not a general TOML reader, and it never allocates.
//!
//! Supported features:
//! - `[protocol]` and `[uart]` section headers
//! - `key = value` pairs with string, integer and boolean values
//! - Underscores in integers (`115_200`)
//! - Comments (`# ...`), whole-line or trailing
//!
//! ```toml
//! [protocol]
//! trailing_bytes = "retain"   # or "discard"
//! synchronizer = "always"     # or "reject-replies"
//! reply_flag = true
//!
//! [uart]
//! baudrate = 115200
//! ```

use bringup_hal::UartConfig;

use crate::sync::SyncMode;

/// What happens to bytes queued behind a dispatched frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrailingBytes {
    /// Keep them for the next processing cycle
    #[default]
    Retain,
    /// Empty the buffer after every dispatch, as older host tools expect
    Discard,
}

/// Runtime protocol settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolConfig {
    /// Handling of bytes queued behind a dispatched frame
    pub trailing: TrailingBytes,
    /// Frame synchronizer
    pub sync: SyncMode,
    /// Mark all responses after the first with the reply flag
    pub reply_flag: bool,
    /// Serial line settings
    pub uart: UartConfig,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            trailing: TrailingBytes::Retain,
            sync: SyncMode::Always,
            reply_flag: true,
            uart: UartConfig::default(),
        }
    }
}

/// Configuration parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value missing or of the wrong type
    InvalidValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Protocol,
    Uart,
}

enum Value<'a> {
    Str(&'a str),
    Int(u32),
    Bool(bool),
}

impl ProtocolConfig {
    /// Parse a configuration file, starting from the defaults
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut section = Section::Root;

        for line in input.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or(ConfigError::InvalidSection)?
                    .trim();
                section = match name {
                    "protocol" => Section::Protocol,
                    "uart" => Section::Uart,
                    _ => return Err(ConfigError::InvalidSection),
                };
                continue;
            }

            let (key, value) = line.split_once('=').ok_or(ConfigError::InvalidValue)?;
            let key = key.trim();
            let value = parse_value(value.trim())?;

            match (section, key, value) {
                (Section::Protocol, "trailing_bytes", Value::Str(s)) => {
                    config.trailing = match s {
                        "retain" => TrailingBytes::Retain,
                        "discard" => TrailingBytes::Discard,
                        _ => return Err(ConfigError::InvalidValue),
                    };
                }
                (Section::Protocol, "synchronizer", Value::Str(s)) => {
                    config.sync = match s {
                        "always" => SyncMode::Always,
                        "reject-replies" => SyncMode::RejectReplies,
                        _ => return Err(ConfigError::InvalidValue),
                    };
                }
                (Section::Protocol, "reply_flag", Value::Bool(b)) => config.reply_flag = b,
                (Section::Uart, "baudrate", Value::Int(n)) if n > 0 => config.uart.baudrate = n,
                (Section::Protocol, "trailing_bytes" | "synchronizer" | "reply_flag", _)
                | (Section::Uart, "baudrate", _) => return Err(ConfigError::InvalidValue),
                _ => return Err(ConfigError::UnknownKey),
            }
        }

        Ok(config)
    }
}

/// Cut a trailing `#` comment that is not inside a quoted string
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

fn parse_value(raw: &str) -> Result<Value<'_>, ConfigError> {
    if let Some(quoted) = raw.strip_prefix('"') {
        return quoted
            .strip_suffix('"')
            .map(Value::Str)
            .ok_or(ConfigError::InvalidValue);
    }

    match raw {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    let mut n: u32 = 0;
    let mut digits = 0;
    for c in raw.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(10).ok_or(ConfigError::InvalidValue)?;
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(d))
            .ok_or(ConfigError::InvalidValue)?;
        digits += 1;
    }
    if digits == 0 {
        return Err(ConfigError::InvalidValue);
    }
    Ok(Value::Int(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_defaults() {
        let config = ProtocolConfig::from_toml("").unwrap();
        assert_eq!(config, ProtocolConfig::default());
        assert_eq!(config.trailing, TrailingBytes::Retain);
        assert!(config.reply_flag);
        assert_eq!(config.uart.baudrate, 115_200);
    }

    #[test]
    fn test_full_file() {
        let input = r#"
# bring-up protocol settings
[protocol]
trailing_bytes = "discard"   # legacy host tool
synchronizer = "reject-replies"
reply_flag = false

[uart]
baudrate = 57_600
"#;
        let config = ProtocolConfig::from_toml(input).unwrap();
        assert_eq!(config.trailing, TrailingBytes::Discard);
        assert_eq!(config.sync, SyncMode::RejectReplies);
        assert!(!config.reply_flag);
        assert_eq!(config.uart.baudrate, 57_600);
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        assert_eq!(strip_comment(r#"a = "x#y" # c"#), r#"a = "x#y" "#);
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            ProtocolConfig::from_toml("[ddr]\n"),
            Err(ConfigError::InvalidSection)
        );
        assert_eq!(
            ProtocolConfig::from_toml("[protocol\n"),
            Err(ConfigError::InvalidSection)
        );
    }

    #[test]
    fn test_key_outside_section() {
        assert_eq!(
            ProtocolConfig::from_toml("baudrate = 9600\n"),
            Err(ConfigError::UnknownKey)
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            ProtocolConfig::from_toml("[uart]\nparity = \"none\"\n"),
            Err(ConfigError::UnknownKey)
        );
    }

    #[test]
    fn test_wrong_value_type() {
        assert_eq!(
            ProtocolConfig::from_toml("[protocol]\nreply_flag = \"yes\"\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            ProtocolConfig::from_toml("[protocol]\ntrailing_bytes = \"keep\"\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            ProtocolConfig::from_toml("[uart]\nbaudrate = 0\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            ProtocolConfig::from_toml("[uart]\nbaudrate = 99999999999\n"),
            Err(ConfigError::InvalidValue)
        );
    }

    #[test]
    fn test_missing_equals() {
        assert_eq!(
            ProtocolConfig::from_toml("[uart]\nbaudrate\n"),
            Err(ConfigError::InvalidValue)
        );
    }
}
