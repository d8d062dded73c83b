//! Command registration table.
//!
//! A [`CommandTable`] maps a command id to the frame size the command must
//! arrive with and the handler that services it. The table is assembled once
//! at start-up through [`CommandTableBuilder`] and is immutable afterwards.
//! Lookup is a linear scan in registration order.

use heapless::Vec;

use crate::frame::{MAX_FRAME_SIZE, RAW_FRAME_SIZE, REPLY_FLAG};
use crate::reply::{Reply, ReplyError};

/// Maximum number of commands in one table
pub const MAX_COMMANDS: usize = 16;

/// Reserved id, never registrable
pub const CMD_ERROR: u8 = 0x00;

/// Command handler
///
/// Receives the application context, the response builder positioned over
/// the request frame, and the request payload size. The handler sends its
/// own response through [`Reply::send`] before returning.
pub type Handler<C> = fn(&mut C, &mut Reply<'_>, u8) -> Result<(), ReplyError>;

/// Errors from building a command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Another entry already uses this id
    DuplicateId(u8),
    /// Id is reserved or has the reply flag set
    ReservedId(u8),
    /// Request does not fit a frame (payload size from `register`, frame
    /// size from `add`)
    InvalidSize(u8),
    /// More than [`MAX_COMMANDS`] entries
    TableFull,
}

/// One registered command
pub struct CommandDescriptor<C> {
    command_id: u8,
    size: u8,
    handler: Handler<C>,
}

// Manual impls: derives would demand `C: Clone`.
impl<C> Clone for CommandDescriptor<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CommandDescriptor<C> {}

impl<C> core::fmt::Debug for CommandDescriptor<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("command_id", &self.command_id)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<C> CommandDescriptor<C> {
    /// Describe a command by its total request frame size
    ///
    /// `size` counts header and checksum, so an empty request is 3 bytes.
    /// Checked when the descriptor is added to a table.
    pub const fn new(command_id: u8, size: u8, handler: Handler<C>) -> Self {
        Self {
            command_id,
            size,
            handler,
        }
    }

    pub fn command_id(&self) -> u8 {
        self.command_id
    }

    /// Expected total request frame size, header and checksum included
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Request payload size passed to the handler
    pub fn payload_size(&self) -> u8 {
        self.size - RAW_FRAME_SIZE as u8
    }

    pub fn handler(&self) -> Handler<C> {
        self.handler
    }
}

/// Immutable id to descriptor mapping
pub struct CommandTable<C> {
    entries: Vec<CommandDescriptor<C>, MAX_COMMANDS>,
}

impl<C> core::fmt::Debug for CommandTable<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<C> CommandTable<C> {
    pub fn builder() -> CommandTableBuilder<C> {
        CommandTableBuilder::new()
    }

    /// Find the descriptor registered for `command_id`
    pub fn find(&self, command_id: u8) -> Option<&CommandDescriptor<C>> {
        self.entries
            .iter()
            .find(|entry| entry.command_id == command_id)
    }

    /// Registration index and a copy of the descriptor for `command_id`
    pub fn lookup(&self, command_id: u8) -> Option<(usize, CommandDescriptor<C>)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.command_id == command_id)
            .map(|(index, entry)| (index, *entry))
    }

    /// Registration index of `command_id`
    pub fn position(&self, command_id: u8) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.command_id == command_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor<C>> {
        self.entries.iter()
    }
}

/// Assembles a [`CommandTable`], checking every entry
pub struct CommandTableBuilder<C> {
    entries: Vec<CommandDescriptor<C>, MAX_COMMANDS>,
}

impl<C> Default for CommandTableBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandTableBuilder<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a command whose request carries `payload_size` bytes
    pub fn register(
        self,
        command_id: u8,
        payload_size: u8,
        handler: Handler<C>,
    ) -> Result<Self, RegistryError> {
        let size = payload_size as usize + RAW_FRAME_SIZE;
        if size > MAX_FRAME_SIZE {
            return Err(RegistryError::InvalidSize(payload_size));
        }
        self.add(CommandDescriptor::new(command_id, size as u8, handler))
    }

    /// Register a prepared descriptor
    pub fn add(mut self, descriptor: CommandDescriptor<C>) -> Result<Self, RegistryError> {
        let id = descriptor.command_id;
        if id == CMD_ERROR || id & REPLY_FLAG != 0 {
            return Err(RegistryError::ReservedId(id));
        }
        if (descriptor.size as usize) < RAW_FRAME_SIZE {
            return Err(RegistryError::InvalidSize(descriptor.size));
        }
        if self.entries.iter().any(|entry| entry.command_id == id) {
            return Err(RegistryError::DuplicateId(id));
        }

        self.entries
            .push(descriptor)
            .map_err(|_| RegistryError::TableFull)?;
        Ok(self)
    }

    pub fn build(self) -> CommandTable<C> {
        CommandTable {
            entries: self.entries,
        }
    }
}
