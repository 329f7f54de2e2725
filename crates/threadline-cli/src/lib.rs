// Library interface for threadline-cli
// Integration tests drive the command parser and chat session through here.

pub mod app;
pub mod commands;

pub use app::ChatSession;
pub use commands::{handle_command, CommandResult};
