//! Speech input abstraction
//!
//! A capture session hears one utterance. For every successful `listen`
//! the backend emits exactly one of `Transcript` or `RecognitionFailed`,
//! followed by `CaptureEnded`. If `listen` itself returns an error, no
//! events follow and the caller treats the error as the failure.

use super::backends::command::CommandInput;
use super::backends::typed::{TypedInput, TypedInputHandle};
use super::events::{EventSender, OperationId};
use crate::config::{InputBackend, RecognitionSettings};
use crate::{RecognitionError, Result};
use log::{info, warn};

/// A request to capture one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenRequest {
    pub id: OperationId,
    /// BCP 47 locale, e.g. "en-US"
    pub language: String,
}

/// Speech-to-text backend
///
/// Only one capture may be active; callers must not start a second
/// before the first has ended or been aborted.
pub trait SpeechInput {
    /// Begin capturing a single utterance
    fn listen(&mut self, request: ListenRequest) -> Result<()>;

    /// Abandon the active capture without reporting a result
    fn abort(&mut self) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Input used when no recognizer is configured or available
pub struct UnavailableInput {
    reason: String,
}

impl UnavailableInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechInput for UnavailableInput {
    fn listen(&mut self, _request: ListenRequest) -> Result<()> {
        Err(RecognitionError::CapabilityUnavailable(self.reason.clone()).into())
    }

    fn abort(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Create the configured speech input
///
/// Also returns a handle for feeding typed answers when the typed
/// backend is in use.
pub fn create_input(
    settings: &RecognitionSettings,
    events: EventSender,
) -> (Box<dyn SpeechInput>, Option<TypedInputHandle>) {
    match settings.backend {
        InputBackend::Typed => {
            info!("Using typed answers as speech input");
            let input = TypedInput::new(events);
            let handle = input.handle();
            (Box::new(input), Some(handle))
        }
        InputBackend::Command => match settings.command.as_deref() {
            Some(command) => match CommandInput::new(command, events) {
                Ok(input) => {
                    info!("Using recognizer command: {}", command);
                    (Box::new(input), None)
                }
                Err(e) => {
                    warn!("Recognizer command unusable: {}", e);
                    (Box::new(UnavailableInput::new(e.to_string())), None)
                }
            },
            None => {
                warn!("recognition.backend=command but recognition.command is not set");
                (
                    Box::new(UnavailableInput::new("no recognizer command configured")),
                    None,
                )
            }
        },
        InputBackend::None => {
            info!("Speech recognition disabled");
            (
                Box::new(UnavailableInput::new("speech recognition disabled")),
                None,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuizError;

    #[test]
    fn test_unavailable_input_fails_immediately() {
        let mut input = UnavailableInput::new("no microphone");
        let result = input.listen(ListenRequest {
            id: OperationId(1),
            language: "en-US".to_string(),
        });

        match result {
            Err(QuizError::Recognition(RecognitionError::CapabilityUnavailable(reason))) => {
                assert_eq!(reason, "no microphone")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_command_backend_without_command() {
        let (events, _rx) = super::super::events::channel();
        let settings = RecognitionSettings {
            backend: InputBackend::Command,
            command: None,
        };
        let (input, handle) = create_input(&settings, events);
        assert_eq!(input.name(), "unavailable");
        assert!(handle.is_none());
    }

    #[test]
    fn test_typed_backend_has_handle() {
        let (events, _rx) = super::super::events::channel();
        let (input, handle) = create_input(&RecognitionSettings::default(), events);
        assert_eq!(input.name(), "typed");
        assert!(handle.is_some());
    }
}
