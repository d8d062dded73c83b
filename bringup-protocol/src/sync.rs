//! Frame synchronization hook.
//!
//! Before the processor trusts the head byte as a command id it asks a
//! [`Synchronizer`]. A negative answer discards exactly one byte and the
//! processor tries again, so preamble detection can be added here without
//! changing the dispatcher.

use crate::frame::{COMMAND_ID_OFFSET, REPLY_FLAG};

/// Decides whether the buffered bytes start at a frame boundary
pub trait Synchronizer {
    /// `pending` holds at least a full header
    fn synchronized(&mut self, pending: &[u8]) -> bool;
}

/// Accepts every position; the command table alone finds frame boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysSynchronized;

impl Synchronizer for AlwaysSynchronized {
    fn synchronized(&mut self, _pending: &[u8]) -> bool {
        true
    }
}

/// Rejects a head byte carrying the reply flag
///
/// Host commands never set bit 7, so such a byte is one of our own replies
/// echoed back on a shared line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectReplies;

impl Synchronizer for RejectReplies {
    fn synchronized(&mut self, pending: &[u8]) -> bool {
        pending
            .get(COMMAND_ID_OFFSET)
            .is_some_and(|&id| id & REPLY_FLAG == 0)
    }
}

/// Configuration-selected synchronizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncMode {
    #[default]
    Always,
    RejectReplies,
}

impl Synchronizer for SyncMode {
    fn synchronized(&mut self, pending: &[u8]) -> bool {
        match self {
            SyncMode::Always => AlwaysSynchronized.synchronized(pending),
            SyncMode::RejectReplies => RejectReplies.synchronized(pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_synchronized() {
        let mut sync = AlwaysSynchronized;
        assert!(sync.synchronized(&[0xFF, 0x00, 0x00]));
        assert!(sync.synchronized(&[0x03, 0x01, 0xFC]));
    }

    #[test]
    fn test_reject_replies() {
        let mut sync = RejectReplies;
        assert!(sync.synchronized(&[0x03, 0x01, 0xFC]));
        assert!(!sync.synchronized(&[0x83, 0x01, 0x7C]));
        assert!(!sync.synchronized(&[]));
    }

    #[test]
    fn test_mode_dispatch() {
        assert!(SyncMode::Always.synchronized(&[0x83, 0x01, 0x7C]));
        assert!(!SyncMode::RejectReplies.synchronized(&[0x83, 0x01, 0x7C]));
        assert_eq!(SyncMode::default(), SyncMode::Always);
    }
}
