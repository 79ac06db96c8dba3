//! Console input and commands
//!
//! Input arrives a line at a time. A line is either a short command, a
//! level choice from the menu, or the answer for the typed recognizer.

pub mod commands;
pub mod line;

pub use commands::{create_default_commands, Command};
pub use line::{LineAction, LineBuffer, LineInterpreter};
