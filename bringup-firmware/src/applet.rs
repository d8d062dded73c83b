//! Application context handed to every command handler

use bringup_protocol::{builtin_table, CommandTable, LoopControl, RegistryError};

/// State shared between the command loop and its handlers
#[derive(Debug, Default)]
pub struct Applet {
    exit: bool,
}

impl Applet {
    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}

impl LoopControl for Applet {
    fn request_exit(&mut self) {
        self.exit = true;
    }
}

/// Commands this applet answers
pub fn command_table() -> Result<CommandTable<Applet>, RegistryError> {
    builtin_table()
}
