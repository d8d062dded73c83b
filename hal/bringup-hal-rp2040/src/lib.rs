//! RP2040 transport for the bring-up command protocol
//!
//! Implements the `bringup-hal` byte traits on top of embassy-rp:
//!
//! - [`uart::BufferedTx`]: blocking writes through the buffered UART
//! - [`uart::ChannelRx`]: non-blocking reads from the receiver task's channel
//! - [`uart::rp_config`]: `UartConfig` to `embassy_rp::uart::Config`

#![no_std]

pub mod uart;

pub use uart::{rp_config, BufferedTx, ChannelRx};
