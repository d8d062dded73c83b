//! Bring-up Command Protocol
//!
//! This crate implements the UART command channel a host tool uses to ping
//! and control a board while it is being brought up. It is a byte-oriented
//! request/response protocol without a start marker; frame boundaries are
//! recovered from the command table, the size byte and the checksum.
//!
//! # Frame Format
//!
//! ```text
//! ┌────────┬──────┬──────────────┬──────────┐
//! │ CMD ID │ SIZE │ PAYLOAD      │ CHECKSUM │
//! │ 1B     │ 1B   │ 0–252B       │ 1B       │
//! └────────┴──────┴──────────────┴──────────┘
//! ```
//!
//! - CMD ID bit 7 marks a response, bits 6:0 name the command
//! - SIZE counts PAYLOAD and CHECKSUM (frame length minus two)
//! - CHECKSUM makes the byte sum of the whole frame zero
//!
//! # Pipeline
//!
//! [`CommandProcessor`] accumulates received bytes, asks a
//! [`Synchronizer`] whether the head byte may start a frame, validates the
//! frame against its [`CommandTable`] entry, dispatches the handler and lets
//! it answer through a [`Reply`]. Malformed input is shed one byte at a
//! time and counted in [`Statistics`].

#![no_std]
#![deny(unsafe_code)]

pub mod buffer;
pub mod command;
pub mod commands;
pub mod config;
pub mod frame;
pub mod processor;
pub mod reply;
pub mod stats;
pub mod sync;

pub use buffer::{RxBuffer, RX_BUFFER_CAPACITY};
pub use command::{CommandDescriptor, CommandTable, CommandTableBuilder, Handler, RegistryError};
pub use commands::{builtin_table, register_builtins, LoopControl};
pub use config::{ConfigError, ProtocolConfig, TrailingBytes};
pub use frame::{checksum, Frame, FrameError, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, REPLY_FLAG};
pub use processor::{CommandProcessor, Rejection};
pub use reply::{Reply, ReplyError, Session};
pub use stats::Statistics;
pub use sync::{AlwaysSynchronized, RejectReplies, SyncMode, Synchronizer};

#[cfg(feature = "defmt")]
pub(crate) use defmt as log;

#[cfg(not(feature = "defmt"))]
pub(crate) mod log {
    macro_rules! trace {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use trace;
    macro_rules! debug {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use debug;
    macro_rules! warner {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use warner as warn;
}
