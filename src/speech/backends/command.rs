//! External recognizer program
//!
//! Each capture runs the configured command once. The program records a
//! single utterance and prints either the transcript as plain text or a
//! JSON object:
//!
//! ```text
//! {"transcript": "it's a cow"}
//! {"error": "no-speech"}
//! ```
//!
//! Error codes follow the Web Speech names (`no-speech`, `not-allowed`,
//! `audio-capture`, `network`, ...). Empty output means no speech; a
//! non-zero exit is a recognizer error.

use crate::speech::events::{EventSender, OperationId, SpeechEvent};
use crate::speech::input::{ListenRequest, SpeechInput};
use crate::{QuizError, RecognitionError, Result};
use log::{debug, error, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Placeholder replaced with the recognition locale
const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// JSON reply from the recognizer
#[derive(Debug, Deserialize)]
struct RecognizerReply {
    transcript: Option<String>,
    error: Option<String>,
}

struct Capture {
    pid: Pid,
    id: OperationId,
    aborted: Arc<AtomicBool>,
}

/// Speech input backed by an external program
pub struct CommandInput {
    argv: Vec<String>,
    current: Option<Capture>,
    events: EventSender,
}

impl CommandInput {
    /// Parse the command line (shell-style quoting)
    pub fn new(command: &str, events: EventSender) -> Result<Self> {
        let argv = shlex::split(command)
            .filter(|argv| !argv.is_empty())
            .ok_or_else(|| QuizError::Config(format!("Invalid recognizer command: {}", command)))?;

        Ok(Self {
            argv,
            current: None,
            events,
        })
    }

    fn stop_current(&mut self) {
        if let Some(capture) = self.current.take() {
            capture.aborted.store(true, Ordering::SeqCst);
            debug!("Stopping recognizer for {}", capture.id);
            match kill(capture.pid, Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => debug!("Failed to stop recognizer: {}", e),
            }
        }
    }
}

/// Substitute the locale into the argument list
fn expand_args(argv: &[String], language: &str) -> Vec<String> {
    argv.iter()
        .map(|arg| arg.replace(LANGUAGE_PLACEHOLDER, language))
        .collect()
}

/// Turn the recognizer's output into a transcript or a failure
fn interpret_output(output: &Output) -> std::result::Result<String, RecognitionError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = stdout.trim();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        return Err(RecognitionError::Provider(if detail.is_empty() {
            format!("recognizer exited with {}", output.status)
        } else {
            detail.to_string()
        }));
    }

    interpret_reply(text)
}

fn interpret_reply(text: &str) -> std::result::Result<String, RecognitionError> {
    if text.starts_with('{') {
        let reply: RecognizerReply = serde_json::from_str(text)
            .map_err(|e| RecognitionError::Provider(format!("bad recognizer reply: {}", e)))?;
        if let Some(code) = reply.error {
            return Err(RecognitionError::from_code(&code));
        }
        return match reply.transcript.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(RecognitionError::NoSpeech),
        };
    }

    if text.is_empty() {
        Err(RecognitionError::NoSpeech)
    } else {
        Ok(text.to_string())
    }
}

impl SpeechInput for CommandInput {
    fn listen(&mut self, request: ListenRequest) -> Result<()> {
        self.stop_current();

        let args = expand_args(&self.argv, &request.language);
        debug!("Starting recognizer ({}): {:?}", request.id, args);

        let child = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!("Failed to start recognizer: {}", e);
                let reason = if e.kind() == ErrorKind::NotFound {
                    format!("{} not found", args[0])
                } else {
                    e.to_string()
                };
                QuizError::from(RecognitionError::CapabilityUnavailable(reason))
            })?;

        let aborted = Arc::new(AtomicBool::new(false));
        self.current = Some(Capture {
            pid: Pid::from_raw(child.id() as i32),
            id: request.id,
            aborted: Arc::clone(&aborted),
        });

        let events = self.events.clone();
        let id = request.id;
        thread::spawn(move || {
            let outcome = child
                .wait_with_output()
                .map_err(|e| RecognitionError::Provider(e.to_string()))
                .and_then(|output| interpret_output(&output));

            if aborted.load(Ordering::SeqCst) {
                debug!("Recognizer for {} aborted, dropping result", id);
                return;
            }

            match outcome {
                Ok(text) => events.emit(SpeechEvent::Transcript { id, text }),
                Err(error) => {
                    warn!("Recognition failed: {}", error);
                    events.emit(SpeechEvent::RecognitionFailed { id, error });
                }
            }
            events.emit(SpeechEvent::CaptureEnded(id));
        });

        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.stop_current();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

impl Drop for CommandInput {
    fn drop(&mut self) {
        self.stop_current();
    }
}
