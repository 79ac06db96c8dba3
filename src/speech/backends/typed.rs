//! Typed answers as a stand-in recognizer
//!
//! When no microphone recognizer is installed the answer is typed on the
//! console instead. `listen` only arms a pending capture; the event loop
//! feeds the next non-command line through `TypedInputHandle::submit`.

use crate::speech::events::{EventSender, OperationId, SpeechEvent};
use crate::speech::input::{ListenRequest, SpeechInput};
use crate::{RecognitionError, Result};
use log::debug;
use std::sync::{Arc, Mutex};

/// Speech input that waits for a typed line
pub struct TypedInput {
    pending: Arc<Mutex<Option<OperationId>>>,
    events: EventSender,
}

/// Handle the event loop uses to deliver typed lines
#[derive(Clone)]
pub struct TypedInputHandle {
    pending: Arc<Mutex<Option<OperationId>>>,
    events: EventSender,
}

impl TypedInput {
    pub fn new(events: EventSender) -> Self {
        Self {
            pending: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn handle(&self) -> TypedInputHandle {
        TypedInputHandle {
            pending: Arc::clone(&self.pending),
            events: self.events.clone(),
        }
    }

    fn set_pending(&self, id: Option<OperationId>) {
        if let Ok(mut guard) = self.pending.lock() {
            *guard = id;
        }
    }
}

impl SpeechInput for TypedInput {
    fn listen(&mut self, request: ListenRequest) -> Result<()> {
        debug!("Waiting for typed answer ({})", request.id);
        self.set_pending(Some(request.id));
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.set_pending(None);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "typed"
    }
}

impl TypedInputHandle {
    /// Whether a capture is waiting for a line
    pub fn is_waiting(&self) -> bool {
        self.pending.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Deliver a typed line as the utterance
    ///
    /// Returns false when no capture was waiting. A blank line counts
    /// as no speech.
    pub fn submit(&self, line: &str) -> bool {
        let id = match self.pending.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(id) = id else {
            return false;
        };

        let text = line.trim();
        if text.is_empty() {
            self.events.emit(SpeechEvent::RecognitionFailed {
                id,
                error: RecognitionError::NoSpeech,
            });
        } else {
            self.events.emit(SpeechEvent::Transcript {
                id,
                text: text.to_string(),
            });
        }
        self.events.emit(SpeechEvent::CaptureEnded(id));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::events::channel;

    fn request(id: u64) -> ListenRequest {
        ListenRequest {
            id: OperationId(id),
            language: "en-US".to_string(),
        }
    }

    #[test]
    fn test_submit_without_capture() {
        let (events, rx) = channel();
        let input = TypedInput::new(events);
        let handle = input.handle();

        assert!(!handle.is_waiting());
        assert!(!handle.submit("cow"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_submit_transcript() {
        let (events, rx) = channel();
        let mut input = TypedInput::new(events);
        let handle = input.handle();

        input.listen(request(4)).unwrap();
        assert!(handle.is_waiting());
        assert!(handle.submit("  it's a cow \n"));
        assert!(!handle.is_waiting());

        assert_eq!(
            rx.try_recv().unwrap(),
            SpeechEvent::Transcript {
                id: OperationId(4),
                text: "it's a cow".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SpeechEvent::CaptureEnded(OperationId(4)));
    }

    #[test]
    fn test_blank_line_is_no_speech() {
        let (events, rx) = channel();
        let mut input = TypedInput::new(events);
        let handle = input.handle();

        input.listen(request(2)).unwrap();
        handle.submit("   ");

        assert_eq!(
            rx.try_recv().unwrap(),
            SpeechEvent::RecognitionFailed {
                id: OperationId(2),
                error: RecognitionError::NoSpeech
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SpeechEvent::CaptureEnded(OperationId(2)));
    }

    #[test]
    fn test_abort_discards_capture() {
        let (events, rx) = channel();
        let mut input = TypedInput::new(events);
        let handle = input.handle();

        input.listen(request(3)).unwrap();
        input.abort().unwrap();
        assert!(!handle.submit("cow"));
        assert!(rx.try_recv().is_err());
    }
}
