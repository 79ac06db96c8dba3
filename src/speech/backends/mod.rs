//! Speech backends

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// espeak-ng subprocess backend (WSLg and bare Linux)
pub mod espeak;

// External recognizer program
pub mod command;

// Typed answers standing in for a recognizer
pub mod typed;
