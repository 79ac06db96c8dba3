//! Completion events reported by speech backends
//!
//! Backends finish their work on helper threads (or inside engine
//! callbacks), so results travel back to the quiz loop as `SpeechEvent`
//! values over a channel. Every event carries the `OperationId` of the
//! request that produced it; the orchestrator drops events whose id is
//! no longer the one it is waiting on.

use crate::RecognitionError;
use log::{debug, warn};
use mio::Waker;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Token identifying one speak or listen request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Something a speech backend finished doing
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// An utterance finished rendering (never sent for cancelled speech)
    UtteranceEnded(OperationId),
    /// A capture session produced a transcript
    Transcript { id: OperationId, text: String },
    /// A capture session failed
    RecognitionFailed {
        id: OperationId,
        error: RecognitionError,
    },
    /// A capture session ended, whatever the outcome
    CaptureEnded(OperationId),
}

impl SpeechEvent {
    /// The request this event belongs to
    pub fn id(&self) -> OperationId {
        match self {
            SpeechEvent::UtteranceEnded(id) | SpeechEvent::CaptureEnded(id) => *id,
            SpeechEvent::Transcript { id, .. } | SpeechEvent::RecognitionFailed { id, .. } => *id,
        }
    }
}

/// Sending half handed to backends
///
/// Optionally wakes a `mio::Poll` so the event loop notices the event
/// without waiting for its timeout.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<SpeechEvent>,
    waker: Option<Arc<Waker>>,
}

impl EventSender {
    pub fn new(tx: Sender<SpeechEvent>) -> Self {
        Self { tx, waker: None }
    }

    /// Wake this poller after every emitted event
    pub fn with_waker(mut self, waker: Arc<Waker>) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Deliver an event to the quiz loop
    pub fn emit(&self, event: SpeechEvent) {
        debug!("Speech event: {:?}", event);
        if self.tx.send(event).is_err() {
            debug!("Event receiver gone, dropping speech event");
            return;
        }
        if let Some(ref waker) = self.waker {
            if let Err(e) = waker.wake() {
                warn!("Failed to wake event loop: {}", e);
            }
        }
    }
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, Receiver<SpeechEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSender::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids() {
        let id = OperationId(7);
        assert_eq!(SpeechEvent::UtteranceEnded(id).id(), id);
        assert_eq!(
            SpeechEvent::Transcript {
                id,
                text: "cow".to_string()
            }
            .id(),
            id
        );
        assert_eq!(id.to_string(), "op#7");
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (sender, rx) = channel();
        sender.emit(SpeechEvent::UtteranceEnded(OperationId(1)));
        sender.emit(SpeechEvent::CaptureEnded(OperationId(2)));

        assert_eq!(rx.try_recv().ok(), Some(SpeechEvent::UtteranceEnded(OperationId(1))));
        assert_eq!(rx.try_recv().ok(), Some(SpeechEvent::CaptureEnded(OperationId(2))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sender, rx) = channel();
        drop(rx);
        // Must not panic
        sender.emit(SpeechEvent::UtteranceEnded(OperationId(1)));
    }
}
