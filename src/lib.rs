//! kidspeak - spoken picture quiz for young children
//!
//! Reads a question aloud, listens for the spoken answer, judges it and
//! walks the child through a bounded number of retries before moving on.

pub mod config;
pub mod error;
pub mod input;
pub mod platform;
pub mod questions;
pub mod quiz;
pub mod speech;

pub use error::{QuizError, RecognitionError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "kidspeak";
