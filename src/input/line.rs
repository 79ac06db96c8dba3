//! Console line handling
//!
//! Bytes read from stdin are collected into lines, and each line is
//! interpreted as a command, a level choice or a typed answer.

use super::commands::Command;
use crate::questions::{Level, QuestionBank};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects raw input until a newline
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes and return every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// Whatever is left once input has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// What a console line asks for
#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    Command(Command),
    SelectLevel(Arc<Level>),
    /// Text for the waiting typed recognizer
    Answer(String),
    Empty,
    Unknown(String),
}

/// Interprets console lines against the command table
pub struct LineInterpreter {
    commands: HashMap<&'static str, Command>,
}

impl LineInterpreter {
    pub fn new(commands: HashMap<&'static str, Command>) -> Self {
        debug!("Creating line interpreter with {} commands", commands.len());
        Self { commands }
    }

    /// Interpret one line
    ///
    /// Commands always win. While an answer is awaited every other line
    /// is the answer, blank ones included; otherwise a level number or
    /// name selects that level.
    pub fn interpret(&self, line: &str, answering: bool, bank: &QuestionBank) -> LineAction {
        let text = line.trim();
        let word = text.to_lowercase();

        if let Some(command) = self.commands.get(word.as_str()) {
            return LineAction::Command(*command);
        }
        if answering {
            return LineAction::Answer(text.to_string());
        }
        if text.is_empty() {
            return LineAction::Empty;
        }

        let level = match text.parse::<usize>() {
            Ok(number) => bank.level_by_number(number),
            Err(_) => bank.level(text),
        };
        match level {
            Some(level) => LineAction::SelectLevel(level),
            None => LineAction::Unknown(text.to_string()),
        }
    }

    /// Help lines, one per command, aliases grouped
    pub fn help_lines(&self) -> Vec<String> {
        let order = [
            Command::Repeat,
            Command::Listen,
            Command::ToggleAutoListen,
            Command::Back,
            Command::Quit,
            Command::Help,
        ];

        order
            .iter()
            .filter_map(|command| {
                let mut words: Vec<&str> = self
                    .commands
                    .iter()
                    .filter(|(_, c)| *c == command)
                    .map(|(w, _)| *w)
                    .collect();
                if words.is_empty() {
                    return None;
                }
                words.sort_by_key(|w| (w.len(), *w));
                Some(format!("  {:<12} {}", words.join(", "), command.describe()))
            })
            .collect()
    }
}
