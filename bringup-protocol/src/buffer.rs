//! Fixed-capacity receive buffer.
//!
//! Bytes are appended at the tail as they arrive and removed from the head
//! as the processor consumes or discards them. The buffer never grows past
//! [`RX_BUFFER_CAPACITY`]: a byte that arrives while it is full empties it
//! first, so the partial content is lost and the new byte becomes the head.

use heapless::Vec;

use crate::frame::MAX_FRAME_SIZE;

/// Receive buffer capacity in bytes
pub const RX_BUFFER_CAPACITY: usize = MAX_FRAME_SIZE;

/// Result of appending one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Append {
    /// Byte stored behind the existing content
    Stored,
    /// Buffer was full and has been reset; the byte is now its only content
    Overflowed,
}

/// Receive buffer owned by the command processor
#[derive(Debug, Clone, Default)]
pub struct RxBuffer {
    bytes: Vec<u8, RX_BUFFER_CAPACITY>,
}

impl RxBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Append one byte at the tail
    pub fn push(&mut self, byte: u8) -> Append {
        match self.bytes.push(byte) {
            Ok(()) => Append::Stored,
            Err(byte) => {
                self.bytes.clear();
                // cannot fail on an empty buffer
                let _ = self.bytes.push(byte);
                Append::Overflowed
            }
        }
    }

    /// Remove exactly one byte from the head
    pub fn discard_head(&mut self) {
        self.consume(1);
    }

    /// Remove the first `count` bytes, keeping the rest in order
    pub fn consume(&mut self, count: usize) {
        let len = self.bytes.len();
        if count >= len {
            self.bytes.clear();
            return;
        }
        self.bytes.copy_within(count.., 0);
        self.bytes.truncate(len - count);
    }

    /// Drop all content
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Buffered bytes, oldest first
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.is_full()
    }

    pub const fn capacity(&self) -> usize {
        RX_BUFFER_CAPACITY
    }
}
