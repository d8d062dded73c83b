//! Protocol settings compiled into the image

use defmt::*;

use bringup_protocol::ProtocolConfig;

/// Embedded configuration, validated by build.rs
/// Edit bringup.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../bringup.toml");

/// Parse the embedded settings, falling back to defaults
pub fn load() -> ProtocolConfig {
    match ProtocolConfig::from_toml(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: trailing={:?} sync={:?} reply_flag={} baud={}",
                config.trailing, config.sync, config.reply_flag, config.uart.baudrate
            );
            config
        }
        Err(e) => {
            warn!("bringup.toml rejected ({:?}), using defaults", e);
            ProtocolConfig::default()
        }
    }
}
