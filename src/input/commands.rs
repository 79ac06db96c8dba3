//! Default console commands for kidspeak

use std::collections::HashMap;

/// Action identifier for console commands
///
/// Each variant is something the child or a parent can ask for by
/// typing a short word on its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read the current question again
    Repeat,
    /// Start listening for the answer now
    Listen,
    /// Turn automatic listening on or off
    ToggleAutoListen,
    /// Leave the level and show the level menu
    Back,
    Quit,
    Help,
}

impl Command {
    /// One-line description for the help screen
    pub fn describe(&self) -> &'static str {
        match self {
            Command::Repeat => "hear the question again",
            Command::Listen => "answer now",
            Command::ToggleAutoListen => "turn auto-listen on or off",
            Command::Back => "back to the levels",
            Command::Quit => "quit",
            Command::Help => "show this help",
        }
    }
}

/// Create the default command table
pub fn create_default_commands() -> HashMap<&'static str, Command> {
    let mut map = HashMap::new();

    map.insert("r", Command::Repeat);
    map.insert("repeat", Command::Repeat);

    map.insert("l", Command::Listen);
    map.insert("listen", Command::Listen);

    map.insert("a", Command::ToggleAutoListen);
    map.insert("auto", Command::ToggleAutoListen);

    map.insert("b", Command::Back);
    map.insert("back", Command::Back);

    map.insert("q", Command::Quit);
    map.insert("quit", Command::Quit);

    map.insert("h", Command::Help);
    map.insert("help", Command::Help);
    map.insert("?", Command::Help);

    map
}
