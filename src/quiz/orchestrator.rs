//! Interaction orchestrator
//!
//! Drives one level: speak the question, listen, judge the answer, give
//! feedback, then retry or move on. Backends report back through
//! `handle_speech_event`; delayed steps run from `run_due_timers`.
//!
//! Only one of speaking and listening is ever active. Each request gets
//! a fresh `OperationId` and events for any other id are dropped, so a
//! cancelled utterance or abandoned capture cannot touch the session.

use super::attempts::AttemptTracker;
use super::celebration::{AudioCue, CELEBRATION_PROSODY};
use super::evaluator::is_correct;
use super::feedback::{self, Feedback, Miss};
use super::timer::{Clock, Scheduler, SystemClock, TimerAction};
use crate::config::QuizSettings;
use crate::questions::{Level, Question};
use crate::speech::{
    ListenRequest, OperationId, Prosody, SpeechEvent, SpeechInput, SpeechOutput, Utterance,
};
use crate::{QuizError, RecognitionError};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Voice for reading questions
pub const QUESTION_PROSODY: Prosody = Prosody::new(1.2, 0.9);
/// Voice for praise
pub const SUCCESS_PROSODY: Prosody = Prosody::new(1.4, 1.1);
/// Voice for retry and reveal messages
pub const FEEDBACK_PROSODY: Prosody = Prosody::new(0.9, 0.9);

/// Stage of the question/answer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Speaking,
    Listening,
    Evaluating,
    Feedback,
    Advancing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Speaking => "speaking",
            Phase::Listening => "listening",
            Phase::Evaluating => "evaluating",
            Phase::Feedback => "feedback",
            Phase::Advancing => "advancing",
        }
    }
}

/// Notifications for the host (menu, display)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A new question is active
    QuestionEntered { index: usize, total: usize },
    /// The last question of the level is done; the session is gone
    LevelCompleted { level: String },
    /// The session was abandoned for the level menu
    ReturnedToLevels,
}

/// Everything the display needs about the active question
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub level: String,
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub image: String,
    pub phase: Phase,
    pub feedback: Option<Feedback>,
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub last_transcript: Option<String>,
    pub listening: bool,
    pub auto_listen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Question,
    Feedback,
}

/// Per-level state, dropped on completion or when leaving the level
struct Session {
    level: Arc<Level>,
    index: usize,
    attempts: AttemptTracker,
    phase: Phase,
    feedback: Option<Feedback>,
    last_transcript: Option<String>,
    /// Set while a capture outcome is handled, cleared by the next capture
    suppress_new_listen: bool,
}

impl Session {
    fn question(&self) -> Option<&Question> {
        self.level.get(self.index)
    }
}

/// The quiz state machine
///
/// Owns the speech channels exclusively: nothing else may speak or
/// listen while a level is running.
pub struct Orchestrator {
    settings: QuizSettings,
    auto_listen: bool,
    output: Box<dyn SpeechOutput>,
    input: Box<dyn SpeechInput>,
    cue: Box<dyn AudioCue>,
    clock: Box<dyn Clock>,
    timers: Scheduler,
    session: Option<Session>,
    speaking: Option<(OperationId, Purpose)>,
    capture: Option<OperationId>,
    next_op: u64,
    host_events: Vec<HostEvent>,
}

impl Orchestrator {
    pub fn new(
        settings: QuizSettings,
        output: Box<dyn SpeechOutput>,
        input: Box<dyn SpeechInput>,
        cue: Box<dyn AudioCue>,
    ) -> Self {
        info!(
            "Quiz loop using {} output and {} input",
            output.name(),
            input.name()
        );
        Self {
            auto_listen: settings.auto_listen,
            settings,
            output,
            input,
            cue,
            clock: Box::new(SystemClock),
            timers: Scheduler::new(),
            session: None,
            speaking: None,
            capture: None,
            next_op: 0,
            host_events: Vec::new(),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Begin a level at its first question, abandoning any running one
    pub fn start_level(&mut self, level: Arc<Level>) {
        self.teardown();
        if level.is_empty() {
            warn!("Level {} has no questions", level.name);
            return;
        }

        info!("Starting level {} ({} questions)", level.name, level.len());
        self.session = Some(Session {
            level,
            index: 0,
            attempts: AttemptTracker::new(self.settings.max_attempts),
            phase: Phase::Idle,
            feedback: None,
            last_transcript: None,
            suppress_new_listen: false,
        });
        self.enter_question(0);
    }

    /// Say the current question again; attempts are kept
    pub fn repeat_question(&mut self) {
        match self.phase() {
            None => return,
            Some(phase @ (Phase::Evaluating | Phase::Advancing)) => {
                debug!("Ignoring repeat while {}", phase.as_str());
                return;
            }
            Some(_) => {}
        }

        self.timers.clear();
        if let Some(session) = self.session.as_mut() {
            session.feedback = None;
        }
        self.speak_question();
    }

    /// Manual "start listening" trigger
    pub fn start_listening(&mut self) {
        match self.phase() {
            None => return,
            Some(phase @ (Phase::Listening | Phase::Evaluating | Phase::Advancing)) => {
                debug!("Ignoring listen request while {}", phase.as_str());
                return;
            }
            Some(_) => {}
        }

        self.timers.clear();
        self.begin_listening();
    }

    /// Leave the level from any state
    pub fn back_to_levels(&mut self) {
        info!("Returning to level selection");
        self.teardown();
        self.host_events.push(HostEvent::ReturnedToLevels);
    }

    pub fn auto_listen(&self) -> bool {
        self.auto_listen
    }

    pub fn set_auto_listen(&mut self, enabled: bool) {
        info!("Auto-listen {}", if enabled { "on" } else { "off" });
        self.auto_listen = enabled;
    }

    /// Flip auto-listen and return the new value
    pub fn toggle_auto_listen(&mut self) -> bool {
        self.set_auto_listen(!self.auto_listen);
        self.auto_listen
    }

    /// Feed a completion or recognition result from a backend
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::UtteranceEnded(id) => self.utterance_ended(id),
            SpeechEvent::Transcript { id, text } => {
                if self.take_capture(id) {
                    self.transcript_received(text);
                }
            }
            SpeechEvent::RecognitionFailed { id, error } => {
                if self.take_capture(id) {
                    self.capture_failed(error);
                }
            }
            SpeechEvent::CaptureEnded(id) => {
                // Only still current when no result came first
                if self.take_capture(id) {
                    debug!("Capture {} ended without a result", id);
                    self.capture_failed(RecognitionError::NoSpeech);
                }
            }
        }
    }

    /// Run every timer action whose deadline has passed
    pub fn run_due_timers(&mut self) {
        while let Some(action) = self.timers.pop_due(self.clock.now()) {
            debug!("Timer fired: {:?}", action);
            match action {
                TimerAction::AutoListen => self.auto_listen_due(),
                TimerAction::ClearFeedback => self.clear_feedback(),
                TimerAction::Advance => self.advance(),
            }
        }
    }

    /// How long the event loop may sleep before the next timer
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.timers.time_until_next(self.clock.now())
    }

    /// Snapshot for rendering, `None` outside a level
    pub fn display(&self) -> Option<DisplayState> {
        let session = self.session.as_ref()?;
        let question = session.question()?;
        Some(DisplayState {
            level: session.level.name.clone(),
            index: session.index,
            total: session.level.len(),
            prompt: question.prompt.clone(),
            image: question.image.clone(),
            phase: session.phase,
            feedback: session.feedback.clone(),
            attempts_used: session.attempts.used(),
            max_attempts: session.attempts.max(),
            last_transcript: session.last_transcript.clone(),
            listening: self.capture.is_some(),
            auto_listen: self.auto_listen,
        })
    }

    /// Take the notifications queued since the last call
    pub fn drain_host_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.host_events)
    }

    pub fn phase(&self) -> Option<Phase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn in_level(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.capture.is_some()
    }

    pub fn attempts_used(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.attempts.used())
    }

    fn enter_question(&mut self, index: usize) {
        self.timers.clear();
        self.stop_capture();

        let total = match self.session.as_mut() {
            Some(session) => {
                session.index = index;
                session.attempts.reset();
                session.feedback = None;
                session.last_transcript = None;
                session.suppress_new_listen = false;
                session.level.len()
            }
            None => return,
        };

        debug!("Entering question {}/{}", index + 1, total);
        self.host_events
            .push(HostEvent::QuestionEntered { index, total });
        self.speak_question();
    }

    fn speak_question(&mut self) {
        let prompt = match self.session.as_ref().and_then(|s| s.question()) {
            Some(question) => question.prompt.clone(),
            None => return,
        };

        self.set_phase(Phase::Speaking);
        if !self.speak(prompt, QUESTION_PROSODY, Purpose::Question) {
            // Nothing will be heard, so carry on as if it had been said
            self.question_spoken();
        }
    }

    fn question_spoken(&mut self) {
        self.set_phase(Phase::Idle);
        self.schedule(self.settings.listen_delay, TimerAction::AutoListen);
    }

    /// Start an utterance after stopping any capture
    ///
    /// Returns false when the backend refused.
    fn speak(&mut self, text: String, prosody: Prosody, purpose: Purpose) -> bool {
        self.stop_capture();

        let id = self.next_id();
        debug!("Speaking ({}): {}", id, text);
        match self.output.speak(Utterance { id, text, prosody }) {
            Ok(()) => {
                self.speaking = Some((id, purpose));
                true
            }
            Err(e) => {
                warn!("Speech output failed: {}", e);
                self.speaking = None;
                false
            }
        }
    }

    fn cancel_speech(&mut self) {
        if let Some((id, _)) = self.speaking.take() {
            debug!("Cancelling speech {}", id);
            if let Err(e) = self.output.cancel() {
                warn!("Failed to cancel speech: {}", e);
            }
        }
    }

    fn begin_listening(&mut self) {
        self.cancel_speech();
        self.stop_capture();

        match self.session.as_mut() {
            Some(session) => {
                session.suppress_new_listen = false;
                session.feedback = Some(Feedback::new(feedback::LISTENING));
            }
            None => return,
        }
        self.set_phase(Phase::Listening);

        let id = self.next_id();
        self.capture = Some(id);
        info!("Listening ({})", id);

        let request = ListenRequest {
            id,
            language: self.settings.language.clone(),
        };
        if let Err(e) = self.input.listen(request) {
            self.capture = None;
            let error = match e {
                QuizError::Recognition(error) => error,
                other => RecognitionError::Provider(other.to_string()),
            };
            self.capture_failed(error);
        }
    }

    fn stop_capture(&mut self) {
        if let Some(id) = self.capture.take() {
            debug!("Aborting capture {}", id);
            if let Err(e) = self.input.abort() {
                warn!("Failed to abort capture: {}", e);
            }
        }
    }

    /// Claim the result of the active capture
    fn take_capture(&mut self, id: OperationId) -> bool {
        if self.capture == Some(id) {
            self.capture = None;
            true
        } else {
            debug!("Ignoring stale capture event for {}", id);
            false
        }
    }

    fn utterance_ended(&mut self, id: OperationId) {
        match self.speaking {
            Some((current, purpose)) if current == id => {
                self.speaking = None;
                if purpose == Purpose::Question && self.phase() == Some(Phase::Speaking) {
                    self.question_spoken();
                }
            }
            _ => debug!("Ignoring end of stale utterance {}", id),
        }
    }

    fn transcript_received(&mut self, text: String) {
        let expected = match self.session.as_mut() {
            Some(session) if !session.suppress_new_listen => {
                session.suppress_new_listen = true;
                session.last_transcript = Some(text.clone());
                session.question().map(|q| q.answer.clone())
            }
            Some(_) => {
                debug!("Already handling an answer, ignoring \"{}\"", text);
                return;
            }
            None => return,
        };
        let Some(expected) = expected else {
            return;
        };

        info!("Heard \"{}\"", text);
        self.set_phase(Phase::Evaluating);
        if is_correct(&text, &expected) {
            self.answered_correctly(&text);
        } else {
            self.missed(Miss::Wrong(text));
        }
    }

    fn capture_failed(&mut self, error: RecognitionError) {
        match self.session.as_mut() {
            Some(session) if !session.suppress_new_listen => session.suppress_new_listen = true,
            Some(_) => {
                debug!("Already handling a failure, ignoring: {}", error);
                return;
            }
            None => return,
        }

        warn!("Recognition failed: {}", error);
        self.set_phase(Phase::Evaluating);
        self.missed(Miss::NotHeard);
    }

    fn answered_correctly(&mut self, transcript: &str) {
        if let Some(session) = self.session.as_mut() {
            session.attempts.reset();
        }
        self.timers.clear();

        if let Err(e) = self.cue.play() {
            warn!("Celebration sound failed: {}", e);
            self.speak(
                feedback::CELEBRATION.to_string(),
                CELEBRATION_PROSODY,
                Purpose::Feedback,
            );
        }

        self.show_feedback(feedback::success(transcript), SUCCESS_PROSODY);
        self.set_phase(Phase::Advancing);
        self.schedule(self.settings.success_delay, TimerAction::Advance);
    }

    fn missed(&mut self, miss: Miss) {
        let (exhausted, remaining, answer) = match self.session.as_mut() {
            Some(session) => {
                let used = session.attempts.increment();
                debug!("Attempt {}/{} missed", used, session.attempts.max());
                (
                    session.attempts.exhausted(),
                    session.attempts.remaining(),
                    session
                        .question()
                        .map(|q| q.answer.clone())
                        .unwrap_or_default(),
                )
            }
            None => return,
        };
        self.timers.clear();

        if exhausted {
            info!("Out of attempts, the answer was {}", answer);
            self.show_feedback(feedback::reveal(&miss, &answer), FEEDBACK_PROSODY);
            self.set_phase(Phase::Advancing);
            self.schedule(self.settings.fail_delay, TimerAction::Advance);
        } else {
            self.show_feedback(feedback::retry(&miss, remaining), FEEDBACK_PROSODY);
            self.set_phase(Phase::Feedback);
            self.schedule(self.settings.retry_delay, TimerAction::ClearFeedback);
        }
    }

    fn show_feedback(&mut self, text: String, prosody: Prosody) {
        if let Some(session) = self.session.as_mut() {
            session.feedback = Some(Feedback::new(text.as_str()));
        }
        self.speak(text, prosody, Purpose::Feedback);
    }

    fn auto_listen_due(&mut self) {
        if !self.auto_listen {
            debug!("Auto-listen off, waiting for a manual trigger");
            return;
        }
        if self.phase() == Some(Phase::Idle) {
            self.begin_listening();
        }
    }

    fn clear_feedback(&mut self) {
        match self.session.as_mut() {
            Some(session) if session.phase == Phase::Feedback => session.feedback = None,
            _ => return,
        }
        self.set_phase(Phase::Idle);
        self.schedule(self.settings.listen_delay, TimerAction::AutoListen);
    }

    fn advance(&mut self) {
        let (next, total, level) = match self.session.as_ref() {
            Some(session) => (
                session.index + 1,
                session.level.len(),
                session.level.name.clone(),
            ),
            None => return,
        };

        if next < total {
            self.enter_question(next);
        } else {
            self.complete_level(level);
        }
    }

    fn complete_level(&mut self, level: String) {
        info!("Level {} complete", level);
        self.timers.clear();
        self.stop_capture();
        self.session = None;
        self.speak(
            feedback::level_complete(&level),
            SUCCESS_PROSODY,
            Purpose::Feedback,
        );
        self.host_events.push(HostEvent::LevelCompleted { level });
    }

    fn teardown(&mut self) {
        self.timers.clear();
        self.cancel_speech();
        self.stop_capture();
        self.session = None;
    }

    fn set_phase(&mut self, phase: Phase) {
        if let Some(session) = self.session.as_mut() {
            if session.phase != phase {
                debug!("{} -> {}", session.phase.as_str(), phase.as_str());
                session.phase = phase;
            }
        }
    }

    fn schedule(&mut self, delay: Duration, action: TimerAction) {
        let when = self.clock.now() + delay;
        self.timers.schedule(when, action);
    }

    fn next_id(&mut self) -> OperationId {
        self.next_op += 1;
        OperationId(self.next_op)
    }
}
