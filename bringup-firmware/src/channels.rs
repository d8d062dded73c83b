//! Inter-task communication channels
//!
//! The receiver task is the only producer of `RX_BYTES`; the command task
//! is the only consumer and owns the processor's buffer outright.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

/// Bytes in flight between the UART and the command processor. One full
/// frame plus slack for the processor task being busy in a handler.
pub const RX_CHANNEL_SIZE: usize = 512;

/// Raw bytes received from the host, in arrival order
pub static RX_BYTES: Channel<CriticalSectionRawMutex, u8, RX_CHANNEL_SIZE> = Channel::new();

/// Raised once the EXIT command has been answered
pub static APPLET_EXIT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
