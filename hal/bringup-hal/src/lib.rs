//! Bring-up Hardware Abstraction Layer
//!
//! The command protocol never touches a UART peripheral directly. It sees
//! the transport through two narrow traits defined here, implemented by the
//! board firmware (or by test doubles on the host).
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  bringup-protocol (framing + dispatch)  │
//! └─────────────────────────────────────────┘
//!            │ try_read_byte   ▲ write_blocking
//!            ▼                 │
//! ┌─────────────────────────────────────────┐
//! │  bringup-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bringup-firmware (embassy-rp adapters) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRx`] - non-blocking supply of received bytes
//! - [`uart::UartTx`] - transmission of a complete byte sequence

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
