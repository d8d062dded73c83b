//! Embassy async tasks
//!
//! The receiver and the command processor run independently and only meet
//! at the byte channel.

pub mod command;
pub mod uart_rx;

pub use command::command_task;
pub use uart_rx::uart_rx_task;
