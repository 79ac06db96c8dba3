//! Error types for kidspeak

use std::io;
use thiserror::Error;

/// Main error type for kidspeak
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Speech recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Audio playback error: {0}")]
    Audio(String),

    #[error("Question set error: {0}")]
    Questions(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a single capture session produced no transcript
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("speech recognition unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("no speech detected")]
    NoSpeech,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("recognition aborted")]
    Aborted,

    #[error("recognizer error: {0}")]
    Provider(String),
}

impl RecognitionError {
    /// Map a Web Speech style error code (`no-speech`, `not-allowed`, ...)
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => RecognitionError::NoSpeech,
            "not-allowed" | "service-not-allowed" => RecognitionError::PermissionDenied,
            "aborted" => RecognitionError::Aborted,
            "not-supported" => {
                RecognitionError::CapabilityUnavailable("not supported".to_string())
            }
            other => RecognitionError::Provider(other.to_string()),
        }
    }
}

/// Result type alias for kidspeak operations
pub type Result<T> = std::result::Result<T, QuizError>;

impl From<String> for QuizError {
    fn from(s: String) -> Self {
        QuizError::Other(s)
    }
}

impl From<&str> for QuizError {
    fn from(s: &str) -> Self {
        QuizError::Other(s.to_string())
    }
}
