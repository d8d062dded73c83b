//! Diagnostic counters.
//!
//! One counter per framing outcome, owned by the processor and readable by
//! anyone holding a shared reference. All counters wrap on overflow.

/// Number of counters reported over the wire by [`Statistics::to_le_bytes`]
pub const REPORTED_COUNTERS: usize = 10;

/// Size of the serialized counter block
pub const STATS_WIRE_SIZE: usize = REPORTED_COUNTERS * 4;

/// Processor and accumulator counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Calls to [`crate::CommandProcessor::process`]
    pub process_command: u32,
    /// Head bytes discarded because no command has that id
    pub bad_id: u32,
    /// Head bytes discarded because the size byte disagreed with the table
    pub bad_size: u32,
    /// Head bytes discarded because the checksum did not match
    pub bad_checksum: u32,
    /// Handlers invoked
    pub handler: u32,
    /// Handlers that returned
    pub handler_done: u32,
    /// Cycles that stopped on a known but incomplete frame
    pub not_full: u32,
    /// Dispatches that found more bytes queued behind the frame
    pub buffer_not_empty: u32,
    /// Head bytes discarded by the synchronizer
    pub unsynchronized: u32,
    /// Receive buffer resets caused by overflow
    pub rx_overflow: u32,
    /// Bytes appended to the receive buffer
    pub rx_bytes: u32,
}

impl Statistics {
    pub const fn new() -> Self {
        Self {
            process_command: 0,
            bad_id: 0,
            bad_size: 0,
            bad_checksum: 0,
            handler: 0,
            handler_done: 0,
            not_full: 0,
            buffer_not_empty: 0,
            unsynchronized: 0,
            rx_overflow: 0,
            rx_bytes: 0,
        }
    }

    /// Total bytes discarded while hunting for a frame
    pub fn discarded(&self) -> u32 {
        self.bad_id
            .wrapping_add(self.bad_size)
            .wrapping_add(self.bad_checksum)
            .wrapping_add(self.unsynchronized)
    }

    /// Counter block as sent in the reply to `CMD_STATS`
    pub fn to_le_bytes(&self) -> [u8; STATS_WIRE_SIZE] {
        let counters: [u32; REPORTED_COUNTERS] = [
            self.process_command,
            self.bad_id,
            self.bad_size,
            self.bad_checksum,
            self.handler,
            self.handler_done,
            self.not_full,
            self.buffer_not_empty,
            self.unsynchronized,
            self.rx_overflow,
        ];

        let mut out = [0u8; STATS_WIRE_SIZE];
        for (chunk, value) in out.chunks_exact_mut(4).zip(counters) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}

pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.wrapping_add(1);
}
