//! Speech output abstraction
//!
//! One utterance is active at a time: starting a new one cancels the
//! previous. Completion is reported as `SpeechEvent::UtteranceEnded`
//! through the backend's `EventSender`, never for cancelled speech.

use super::events::{EventSender, OperationId};
use crate::config::{OutputBackend, SpeechSettings};
use crate::platform::is_wsl;
use crate::Result;
use log::{debug, info};

/// Pitch and rate multipliers, where 1.0 is the engine's normal value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    pub pitch: f32,
    pub rate: f32,
}

impl Prosody {
    pub const NORMAL: Prosody = Prosody {
        pitch: 1.0,
        rate: 1.0,
    };

    pub const fn new(pitch: f32, rate: f32) -> Self {
        Self { pitch, rate }
    }
}

impl Default for Prosody {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// A request to say something
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: OperationId,
    pub text: String,
    pub prosody: Prosody,
}

/// Text-to-speech backend
///
/// Implementations must cancel any in-flight utterance before starting
/// a new one, and report completion only for the utterance that
/// actually finished.
pub trait SpeechOutput {
    /// Start speaking. Returns once rendering has begun.
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Silence the current utterance, if any
    fn cancel(&mut self) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Output used when no speech engine is available
///
/// Speaking is a no-op and completion is never reported.
pub struct SilentOutput;

impl SpeechOutput for SilentOutput {
    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        debug!("(silent) {}", utterance.text);
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Create the configured speech output, falling back to silence
///
/// `auto` tries, in order:
///
/// **WSL:** espeak-ng, then the native engine
///
/// **Linux:** the native engine (Speech Dispatcher), then espeak-ng
///
/// **macOS / others:** the native engine
pub fn create_output(settings: &SpeechSettings, events: EventSender) -> Box<dyn SpeechOutput> {
    use super::backends::espeak::EspeakOutput;
    use super::backends::native::NativeOutput;

    let platform = std::env::consts::OS;
    let order: &[OutputBackend] = match settings.backend {
        OutputBackend::Silent => &[],
        OutputBackend::Native => &[OutputBackend::Native],
        OutputBackend::Espeak => &[OutputBackend::Espeak],
        OutputBackend::Auto if platform == "linux" && is_wsl() => {
            info!("Detected WSL environment");
            &[OutputBackend::Espeak, OutputBackend::Native]
        }
        OutputBackend::Auto if platform == "linux" => {
            &[OutputBackend::Native, OutputBackend::Espeak]
        }
        OutputBackend::Auto => &[OutputBackend::Native],
    };

    for backend in order {
        let created: Result<Box<dyn SpeechOutput>> = match backend {
            OutputBackend::Native => {
                info!("Trying native TTS backend...");
                NativeOutput::new(settings, events.clone())
                    .map(|o| Box::new(o) as Box<dyn SpeechOutput>)
            }
            OutputBackend::Espeak => {
                info!("Trying espeak-ng backend...");
                EspeakOutput::new(settings, events.clone())
                    .map(|o| Box::new(o) as Box<dyn SpeechOutput>)
            }
            _ => continue,
        };

        match created {
            Ok(output) => {
                info!("✓ Using {} speech output", output.name());
                return output;
            }
            Err(e) => info!("✗ {:?} backend unavailable: {}", backend, e),
        }
    }

    info!("No speech output available, questions will not be read aloud");
    Box::new(SilentOutput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_output() {
        let mut output = SilentOutput;
        let utterance = Utterance {
            id: OperationId(1),
            text: "What animal is this?".to_string(),
            prosody: Prosody::new(1.2, 0.9),
        };
        assert!(output.speak(utterance).is_ok());
        assert!(output.cancel().is_ok());
        assert_eq!(output.name(), "silent");
    }

    #[test]
    fn test_silent_backend_selected() {
        let (events, _rx) = super::super::events::channel();
        let settings = SpeechSettings {
            backend: OutputBackend::Silent,
            ..SpeechSettings::default()
        };
        assert_eq!(create_output(&settings, events).name(), "silent");
    }
}
