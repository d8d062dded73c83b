//! Built-in commands every applet answers.
//!
//! Applications register these next to their own through
//! [`register_builtins`], or use [`builtin_table`] when they need nothing
//! else.

use crate::command::{CommandTable, CommandTableBuilder, RegistryError};
use crate::log::debug;
use crate::reply::{Reply, ReplyError};

/// Ping: echo an empty frame
pub const CMD_PING: u8 = 0x03;
/// Exit: reply, then leave the command loop
pub const CMD_EXIT: u8 = 0x04;
/// Read the processor counters
pub const CMD_STATS: u8 = 0x05;
/// Read the firmware version
pub const CMD_VERSION: u8 = 0x06;
/// Highest id reserved for commands every applet shares
pub const CMD_LAST_COMMON: u8 = 0x2B;

/// Firmware version reported by `CMD_VERSION` (major, minor, patch)
pub const FW_VERSION: [u8; 3] = [0, 1, 0];

/// Application hooks the built-in commands need
pub trait LoopControl {
    /// Ask the main loop to stop after the current cycle
    fn request_exit(&mut self);
}

pub fn cmd_ping<C>(_app: &mut C, reply: &mut Reply<'_>, size: u8) -> Result<(), ReplyError> {
    debug!("PING");
    reply.send(size)
}

pub fn cmd_exit<C: LoopControl>(
    app: &mut C,
    reply: &mut Reply<'_>,
    size: u8,
) -> Result<(), ReplyError> {
    debug!("EXIT");
    // the reply must be on the wire before the loop can tear down
    let sent = reply.send(size).and_then(|()| reply.flush());
    app.request_exit();
    sent
}

pub fn cmd_stats<C>(_app: &mut C, reply: &mut Reply<'_>, _size: u8) -> Result<(), ReplyError> {
    let counters = reply.stats().to_le_bytes();
    reply.send_payload(&counters)
}

pub fn cmd_version<C>(_app: &mut C, reply: &mut Reply<'_>, _size: u8) -> Result<(), ReplyError> {
    reply.send_payload(&FW_VERSION)
}

/// Add the built-in commands to `builder`
pub fn register_builtins<C: LoopControl>(
    builder: CommandTableBuilder<C>,
) -> Result<CommandTableBuilder<C>, RegistryError> {
    builder
        .register(CMD_PING, 0, cmd_ping::<C>)?
        .register(CMD_EXIT, 0, cmd_exit::<C>)?
        .register(CMD_STATS, 0, cmd_stats::<C>)?
        .register(CMD_VERSION, 0, cmd_version::<C>)
}

/// Table holding only the built-in commands
pub fn builtin_table<C: LoopControl>() -> Result<CommandTable<C>, RegistryError> {
    Ok(register_builtins(CommandTable::builder())?.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_to_vec, Frame};
    use crate::stats::STATS_WIRE_SIZE;
    use crate::{CommandProcessor, ProtocolConfig};
    use bringup_hal::UartTx;
    use heapless::Vec;

    #[derive(Default)]
    struct App {
        exit: bool,
    }

    impl LoopControl for App {
        fn request_exit(&mut self) {
            self.exit = true;
        }
    }

    #[derive(Default)]
    struct Wire {
        sent: Vec<u8, 256>,
        flushes: usize,
    }

    impl UartTx for Wire {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            self.sent.clear();
            self.sent.extend_from_slice(data)
        }

        fn flush(&mut self) -> Result<(), ()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn run(processor: &mut CommandProcessor<App>, app: &mut App, id: u8) -> Wire {
        let mut wire = Wire::default();
        for b in encode_to_vec(id, &[]).unwrap() {
            processor.push(b);
        }
        assert_eq!(processor.process(app, &mut wire), Some(id));
        wire
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let table = builtin_table::<App>().unwrap();
        assert_eq!(table.len(), 4);
        for id in [CMD_PING, CMD_EXIT, CMD_STATS, CMD_VERSION] {
            assert_eq!(table.find(id).unwrap().size(), 3);
        }
    }

    #[test]
    fn test_exit_replies_then_raises_flag() {
        let mut processor = CommandProcessor::new(builtin_table().unwrap(), ProtocolConfig::default());
        let mut app = App::default();

        let wire = run(&mut processor, &mut app, CMD_EXIT);
        assert!(app.exit);
        assert_eq!(&wire.sent[..], &[0x04, 0x01, 0xFB]);
        assert_eq!(wire.flushes, 1);
    }

    #[test]
    fn test_ping_does_not_flush() {
        let mut processor = CommandProcessor::new(builtin_table().unwrap(), ProtocolConfig::default());
        let mut app = App::default();

        let wire = run(&mut processor, &mut app, CMD_PING);
        assert!(!app.exit);
        assert_eq!(wire.flushes, 0);
    }

    #[test]
    fn test_builtins_within_common_range() {
        let table = builtin_table::<App>().unwrap();
        assert!(table.iter().all(|d| d.command_id() <= CMD_LAST_COMMON));
    }

    #[test]
    fn test_version_payload() {
        let mut processor = CommandProcessor::new(builtin_table().unwrap(), ProtocolConfig::default());
        let mut app = App::default();

        let wire = run(&mut processor, &mut app, CMD_VERSION);
        let frame = Frame::parse(&wire.sent).unwrap();
        assert_eq!(frame.command_id(), CMD_VERSION);
        assert_eq!(frame.payload(), &FW_VERSION);
    }

    #[test]
    fn test_stats_payload_reflects_counters() {
        let mut processor = CommandProcessor::new(builtin_table().unwrap(), ProtocolConfig::default());
        let mut app = App::default();

        run(&mut processor, &mut app, CMD_PING);
        // garbage ahead of the next frame
        processor.push(0x7E);
        let wire = run(&mut processor, &mut app, CMD_STATS);

        let frame = Frame::parse(&wire.sent).unwrap();
        assert!(frame.is_reply());
        let payload = frame.payload();
        assert_eq!(payload.len(), STATS_WIRE_SIZE);

        let counter = |i: usize| {
            u32::from_le_bytes([
                payload[i * 4],
                payload[i * 4 + 1],
                payload[i * 4 + 2],
                payload[i * 4 + 3],
            ])
        };
        assert_eq!(counter(0), 2); // process_command
        assert_eq!(counter(1), 1); // bad_id
        assert_eq!(counter(4), 2); // handler, current one included
        assert_eq!(counter(5), 1); // handler_done
    }
}
