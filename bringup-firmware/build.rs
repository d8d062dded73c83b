//! Build script for bringup-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bringup.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Shape of bringup.toml. Every section and key is optional; the firmware
/// falls back to its defaults for anything left out.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BringupToml {
    protocol: Option<ProtocolSection>,
    uart: Option<UartSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProtocolSection {
    trailing_bytes: Option<String>,
    synchronizer: Option<String>,
    #[allow(dead_code)]
    reply_flag: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UartSection {
    baudrate: Option<i64>,
}

/// Validate bringup.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=bringup.toml");

    let config_path = Path::new("bringup.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bringup.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds bringup.toml as its protocol settings.      ║\n\
            ║  Please create one in the bringup-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bringup.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Syntax and unknown keys
    let config: BringupToml = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid bringup.toml                                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let errors = validate_values(&config);
    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid values in bringup.toml                           ║\n\
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

    println!("cargo:warning=bringup.toml validated successfully");
}

/// Check enumerated strings and numeric ranges
fn validate_values(config: &BringupToml) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(protocol) = &config.protocol {
        if let Some(mode) = &protocol.trailing_bytes {
            if !["retain", "discard"].contains(&mode.as_str()) {
                errors.push(format!(
                    "[protocol] trailing_bytes must be 'retain' or 'discard', not '{}'",
                    mode
                ));
            }
        }
        if let Some(sync) = &protocol.synchronizer {
            if !["always", "reject-replies"].contains(&sync.as_str()) {
                errors.push(format!(
                    "[protocol] synchronizer must be 'always' or 'reject-replies', not '{}'",
                    sync
                ));
            }
        }
    }

    if let Some(uart) = &config.uart {
        if let Some(baudrate) = uart.baudrate {
            if baudrate <= 0 || baudrate > u32::MAX as i64 {
                errors.push(format!("[uart] baudrate {} out of range", baudrate));
            }
        }
    }

    errors
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
