//! Command processor: accumulate, synchronize, validate, dispatch.
//!
//! Bytes enter through [`CommandProcessor::push`] (or are drained from a
//! [`UartRx`] by [`CommandProcessor::receive`]). Each call to
//! [`CommandProcessor::process`] then services at most one frame:
//!
//! ```text
//!  ┌──────────────┐  no  ┌─────────────┐
//!  │ > header?    ├─────►│ wait (None) │◄──────────────┐
//!  └──────┬───────┘      └─────────────┘               │
//!         ▼                                            │ frame incomplete
//!  synchronized? ── id known? ── size matches? ── all bytes present?
//!         │ no          │ no           │ no                 │
//!         └─────────────┴──────────────┴─► discard 1 byte,  │
//!                                          try again        ▼
//!                                             checksum ok? ─ no ─► discard 1 byte
//!                                                   │ yes
//!                                                   ▼
//!                                     dispatch handler, return Some(id)
//! ```
//!
//! Every rejection removes exactly one byte, so garbage is flushed in at
//! most `buffer length` iterations and a frame hiding behind noise is found
//! as soon as the noise in front of it has been shifted out.

use bringup_hal::{UartRx, UartTx};

use crate::buffer::{Append, RxBuffer};
use crate::command::{CommandTable, Handler, MAX_COMMANDS};
use crate::config::{ProtocolConfig, TrailingBytes};
use crate::frame::{
    checksum, COMMAND_ID_OFFSET, HEADER_SIZE, MAX_FRAME_SIZE, PAYLOAD_SIZE_OFFSET, RAW_FRAME_SIZE,
};
use crate::log::{debug, trace, warn};
use crate::reply::{Reply, Session, Transmit};
use crate::stats::{bump, Statistics};
use crate::sync::{SyncMode, Synchronizer};

/// Reason a head byte was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Synchronizer did not accept the position
    Unsynchronized,
    /// No command registered under the head byte
    UnknownCommand,
    /// Size byte disagrees with the registered frame size
    SizeMismatch,
    /// Trailing byte does not match the computed checksum
    BadChecksum,
}

/// Protocol core: owns the receive buffer, the command table and the
/// session state
pub struct CommandProcessor<C, S = SyncMode> {
    rx: RxBuffer,
    scratch: [u8; MAX_FRAME_SIZE],
    table: CommandTable<C>,
    calls: [u32; MAX_COMMANDS],
    session: Session,
    sync: S,
    config: ProtocolConfig,
    stats: Statistics,
}

impl<C> CommandProcessor<C, SyncMode> {
    /// Create a processor using the synchronizer named in `config`
    pub fn new(table: CommandTable<C>, config: ProtocolConfig) -> Self {
        Self::with_synchronizer(table, config, config.sync)
    }
}

impl<C, S: Synchronizer> CommandProcessor<C, S> {
    /// Create a processor with a custom synchronizer
    pub fn with_synchronizer(table: CommandTable<C>, config: ProtocolConfig, sync: S) -> Self {
        Self {
            rx: RxBuffer::new(),
            scratch: [0; MAX_FRAME_SIZE],
            table,
            calls: [0; MAX_COMMANDS],
            session: Session::new(),
            sync,
            config,
            stats: Statistics::new(),
        }
    }

    /// Append one received byte
    pub fn push(&mut self, byte: u8) {
        bump(&mut self.stats.rx_bytes);
        if self.rx.push(byte) == Append::Overflowed {
            bump(&mut self.stats.rx_overflow);
            warn!("rx buffer overflow, {} bytes dropped", self.rx.capacity());
        }
    }

    /// Move pending bytes from `source` into the receive buffer
    ///
    /// Stops once the buffer is full, leaving the rest queued in `source`
    /// until a processing cycle has made room. Returns the number of bytes
    /// taken.
    pub fn receive<R: UartRx>(&mut self, source: &mut R) -> Result<usize, R::Error> {
        let mut count = 0;
        while !self.rx.is_full() {
            let Some(byte) = source.try_read_byte()? else {
                break;
            };
            self.push(byte);
            count += 1;
        }
        Ok(count)
    }

    /// Run one validation cycle
    ///
    /// Returns the id of the dispatched command, or `None` when the buffer
    /// does not (yet) hold a complete valid frame.
    pub fn process<T: UartTx>(&mut self, app: &mut C, tx: &mut T) -> Option<u8> {
        bump(&mut self.stats.process_command);

        loop {
            // need at least a header plus one byte
            if self.rx.len() <= HEADER_SIZE {
                return None;
            }

            let pending = self.rx.as_slice();
            if !self.sync.synchronized(pending) {
                self.reject(Rejection::Unsynchronized);
                continue;
            }

            let command_id = pending[COMMAND_ID_OFFSET];
            let Some((index, descriptor)) = self.table.lookup(command_id) else {
                self.reject(Rejection::UnknownCommand);
                continue;
            };

            let expected = descriptor.size() as usize;
            let declared = pending[PAYLOAD_SIZE_OFFSET] as usize + HEADER_SIZE;
            if declared != expected {
                self.reject(Rejection::SizeMismatch);
                continue;
            }

            if pending.len() < expected {
                bump(&mut self.stats.not_full);
                trace!("frame {=u8:#x} incomplete: {}/{}", command_id, pending.len(), expected);
                return None;
            }

            if checksum(&pending[..expected - 1]) != pending[expected - 1] {
                self.reject(Rejection::BadChecksum);
                continue;
            }

            self.scratch[..expected].copy_from_slice(&pending[..expected]);
            if pending.len() > expected {
                bump(&mut self.stats.buffer_not_empty);
            }
            match self.config.trailing {
                TrailingBytes::Retain => self.rx.consume(expected),
                TrailingBytes::Discard => self.rx.clear(),
            }

            self.dispatch(index, descriptor.handler(), expected, app, tx);
            return Some(command_id);
        }
    }

    /// Pull pending bytes from `source`, then run one validation cycle
    pub fn poll<R: UartRx, T: UartTx>(
        &mut self,
        app: &mut C,
        source: &mut R,
        tx: &mut T,
    ) -> Result<Option<u8>, R::Error> {
        self.receive(source)?;
        if self.rx.is_empty() {
            return Ok(None);
        }
        Ok(self.process(app, tx))
    }

    fn dispatch<T: UartTx>(
        &mut self,
        index: usize,
        handler: Handler<C>,
        size: usize,
        app: &mut C,
        tx: &mut T,
    ) {
        let command_id = self.scratch[COMMAND_ID_OFFSET];
        debug!("dispatch {=u8:#x} ({} bytes)", command_id, size);

        bump(&mut self.stats.handler);
        bump(&mut self.calls[index]);

        let flag_reply = self.config.reply_flag && !self.session.is_first();
        let tx: &mut dyn Transmit = tx;
        let mut reply = Reply::new(&mut self.scratch, size, flag_reply, &self.stats, tx);
        let result = handler(app, &mut reply, (size - RAW_FRAME_SIZE) as u8);
        let responses = reply.responses_sent();

        if let Err(e) = result {
            warn!("handler {=u8:#x} failed: {:?}", command_id, e);
        } else if responses == 0 {
            warn!("handler {=u8:#x} sent no response", command_id);
        }

        bump(&mut self.stats.handler_done);
        self.session.command_done();
    }

    fn reject(&mut self, reason: Rejection) {
        let counter = match reason {
            Rejection::Unsynchronized => &mut self.stats.unsynchronized,
            Rejection::UnknownCommand => &mut self.stats.bad_id,
            Rejection::SizeMismatch => &mut self.stats.bad_size,
            Rejection::BadChecksum => &mut self.stats.bad_checksum,
        };
        bump(counter);
        trace!("discard {=u8:#x}: {:?}", self.rx.as_slice()[0], reason);
        self.rx.discard_head();
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Times the command registered under `command_id` has been dispatched
    pub fn calls(&self, command_id: u8) -> Option<u32> {
        self.table
            .position(command_id)
            .map(|index| self.calls[index])
    }

    pub fn table(&self) -> &CommandTable<C> {
        &self.table
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Bytes waiting in the receive buffer
    pub fn buffered(&self) -> &[u8] {
        self.rx.as_slice()
    }

    /// No command has been dispatched in this session yet
    pub fn is_first_response(&self) -> bool {
        self.session.is_first()
    }
}
