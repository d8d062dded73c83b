//! Response builder.
//!
//! A handler gets a [`Reply`] laid over a copy of the request frame. The
//! payload area is both where the request payload is read from and where
//! the response payload is written, so a handler that leaves it untouched
//! echoes the request. [`Reply::send`] fills in the size byte, the reply
//! flag and the checksum, then transmits the frame.

use bringup_hal::UartTx;

use crate::frame::{
    checksum, frame_size, COMMAND_ID_OFFSET, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
    PAYLOAD_OFFSET, PAYLOAD_SIZE_OFFSET, REPLY_FLAG,
};
use crate::stats::Statistics;

/// Errors a handler can hit while responding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    /// Response payload larger than a frame can carry
    PayloadTooLarge,
    /// Byte sink reported an error
    Transmit,
}

/// Object-safe view of a [`UartTx`] with its error erased
pub(crate) trait Transmit {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), ReplyError>;
    fn drain(&mut self) -> Result<(), ReplyError>;
}

impl<T: UartTx> Transmit for T {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), ReplyError> {
        self.write_blocking(bytes).map_err(|_| ReplyError::Transmit)
    }

    fn drain(&mut self) -> Result<(), ReplyError> {
        UartTx::flush(self).map_err(|_| ReplyError::Transmit)
    }
}

/// Session-wide reply state
///
/// The first response of a session goes out with the command id unchanged;
/// every later one carries [`REPLY_FLAG`]. There is no reset short of
/// creating a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    first_command: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const fn new() -> Self {
        Self {
            first_command: true,
        }
    }

    /// No command has been dispatched yet
    pub fn is_first(&self) -> bool {
        self.first_command
    }

    /// Called once a command has been dispatched
    pub(crate) fn command_done(&mut self) {
        self.first_command = false;
    }
}

/// Response builder handed to command handlers
pub struct Reply<'a> {
    frame: &'a mut [u8; MAX_FRAME_SIZE],
    request_size: usize,
    flag_reply: bool,
    stats: &'a Statistics,
    tx: &'a mut dyn Transmit,
    sent: usize,
}

impl<'a> Reply<'a> {
    pub(crate) fn new(
        frame: &'a mut [u8; MAX_FRAME_SIZE],
        request_size: usize,
        flag_reply: bool,
        stats: &'a Statistics,
        tx: &'a mut dyn Transmit,
    ) -> Self {
        Self {
            frame,
            request_size,
            flag_reply,
            stats,
            tx,
            sent: 0,
        }
    }

    /// Command id of the request being serviced
    pub fn command_id(&self) -> u8 {
        self.frame[COMMAND_ID_OFFSET] & !REPLY_FLAG
    }

    /// Request payload
    pub fn request(&self) -> &[u8] {
        &self.frame[PAYLOAD_OFFSET..self.request_size - 1]
    }

    /// Writable payload area, [`MAX_PAYLOAD_SIZE`] bytes long
    ///
    /// Starts out holding the request payload.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + MAX_PAYLOAD_SIZE]
    }

    /// Processor counters as they stood when the handler was invoked
    pub fn stats(&self) -> &Statistics {
        self.stats
    }

    /// Number of responses sent through this builder
    pub fn responses_sent(&self) -> usize {
        self.sent
    }

    /// Frame and transmit a response whose payload is the first
    /// `payload_size` bytes of [`Reply::payload_mut`]
    pub fn send(&mut self, payload_size: u8) -> Result<(), ReplyError> {
        let payload_size = payload_size as usize;
        if payload_size > MAX_PAYLOAD_SIZE {
            return Err(ReplyError::PayloadTooLarge);
        }

        let size = frame_size(payload_size);
        self.frame[PAYLOAD_SIZE_OFFSET] = (size - HEADER_SIZE) as u8;
        if self.flag_reply {
            self.frame[COMMAND_ID_OFFSET] |= REPLY_FLAG;
        }
        self.frame[size - 1] = checksum(&self.frame[..size - 1]);

        self.tx.transmit(&self.frame[..size])?;
        self.sent += 1;
        Ok(())
    }

    /// Block until every response sent so far has left the sink
    pub fn flush(&mut self) -> Result<(), ReplyError> {
        self.tx.drain()
    }

    /// Copy `payload` into the payload area and send it
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<(), ReplyError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ReplyError::PayloadTooLarge);
        }
        self.payload_mut()[..payload.len()].copy_from_slice(payload);
        self.send(payload.len() as u8)
    }
}
