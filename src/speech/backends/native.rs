//! Native TTS backend using the tts crate
//!
//! The `tts` crate fronts Speech Dispatcher on Linux, AVFoundation on
//! macOS and WinRT/SAPI on Windows. Completion comes from the crate's
//! utterance-end callback, which runs on an engine thread.

use crate::config::SpeechSettings;
use crate::speech::events::{EventSender, OperationId, SpeechEvent};
use crate::speech::output::{Prosody, SpeechOutput, Utterance};
use crate::speech::voice::{select_voice, VoiceInfo};
use crate::{QuizError, Result};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tts::{Features, Gender, Tts, UtteranceId};

/// Which utterance we are waiting on
///
/// The engine may report an end before `speak` has returned its id, so
/// unmatched ends are parked in `unclaimed` and checked right after
/// speaking.
#[derive(Default)]
struct EndTracker {
    current: Option<(UtteranceId, OperationId)>,
    unclaimed: Option<UtteranceId>,
}

/// Native TTS backend
pub struct NativeOutput {
    tts: Tts,
    features: Features,
    tracker: Arc<Mutex<EndTracker>>,
    events: EventSender,
}

impl NativeOutput {
    /// Initialize the platform TTS engine and pick a voice
    pub fn new(settings: &SpeechSettings, events: EventSender) -> Result<Self> {
        debug!("Creating native TTS backend");

        let mut tts = Tts::default()
            .map_err(|e| QuizError::Speech(format!("Failed to initialize TTS: {}", e)))?;
        let features = tts.supported_features();
        let tracker = Arc::new(Mutex::new(EndTracker::default()));

        if features.utterance_callbacks {
            let slot = Arc::clone(&tracker);
            let sink = events.clone();
            tts.on_utterance_end(Some(Box::new(move |utterance| {
                let finished = match slot.lock() {
                    Ok(mut guard) => match guard.current {
                        Some((uid, op)) if uid == utterance => {
                            guard.current = None;
                            Some(op)
                        }
                        _ => {
                            guard.unclaimed = Some(utterance);
                            None
                        }
                    },
                    Err(_) => None,
                };
                if let Some(op) = finished {
                    sink.emit(SpeechEvent::UtteranceEnded(op));
                }
            })))
            .map_err(|e| QuizError::Speech(format!("Failed to register callback: {}", e)))?;
        } else {
            warn!("Engine cannot report utterance completion; auto-listen will not trigger");
        }

        if let Some(volume) = settings.volume {
            if features.volume {
                let level = volume as f32 / 100.0;
                let scaled = tts.min_volume() + (tts.max_volume() - tts.min_volume()) * level;
                if let Err(e) = tts.set_volume(scaled) {
                    warn!("Failed to set volume: {}", e);
                }
            } else {
                warn!("Volume control not supported on this platform");
            }
        }

        let mut output = Self {
            tts,
            features,
            tracker,
            events,
        };
        if output.features.voice {
            output.choose_voice(settings.voice.as_deref());
        }

        debug!("Native TTS backend created successfully");
        Ok(output)
    }

    fn choose_voice(&mut self, preferred: Option<&str>) {
        let voices = match self.tts.voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Failed to list voices: {}", e);
                return;
            }
        };

        let infos: Vec<VoiceInfo> = voices
            .iter()
            .map(|v| VoiceInfo::new(v.name(), matches!(v.gender(), Some(Gender::Female))))
            .collect();

        if let Some(idx) = select_voice(&infos, preferred) {
            info!("Selecting voice: {}", infos[idx].name);
            if let Err(e) = self.tts.set_voice(&voices[idx]) {
                warn!("Failed to set voice: {}", e);
            }
        } else {
            debug!("No preferred voice found among {}, keeping default", voices.len());
        }
    }

    fn apply_prosody(&mut self, prosody: Prosody) {
        if self.features.rate {
            let rate = scale(
                prosody.rate,
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            if let Err(e) = self.tts.set_rate(rate) {
                warn!("Failed to set rate: {}", e);
            }
        }
        if self.features.pitch {
            let pitch = scale(
                prosody.pitch,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            if let Err(e) = self.tts.set_pitch(pitch) {
                warn!("Failed to set pitch: {}", e);
            }
        }
    }
}

/// Map a multiplier (0.0-2.0, 1.0 = normal) onto an engine range
///
/// Engines disagree wildly on ranges (Speech Dispatcher uses -100..100
/// with 0 as normal), so below 1.0 interpolates toward `min` and above
/// toward `max`.
fn scale(multiplier: f32, min: f32, normal: f32, max: f32) -> f32 {
    let m = multiplier.clamp(0.0, 2.0);
    if m >= 1.0 {
        normal + (max - normal) * (m - 1.0)
    } else {
        normal - (normal - min) * (1.0 - m)
    }
}

impl SpeechOutput for NativeOutput {
    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        if utterance.text.is_empty() {
            return Ok(());
        }

        self.apply_prosody(utterance.prosody);

        if let Ok(mut guard) = self.tracker.lock() {
            *guard = EndTracker::default();
        }

        debug!("Speaking ({}): {}", utterance.id, utterance.text);
        let uid = self.tts.speak(utterance.text.as_str(), true).map_err(|e| {
            error!("Failed to speak: {}", e);
            QuizError::Speech(format!("Speak failed: {}", e))
        })?;

        let Some(uid) = uid else {
            debug!("Engine returned no utterance id; completion cannot be tracked");
            return Ok(());
        };

        let already_done = match self.tracker.lock() {
            Ok(mut guard) => {
                if guard.unclaimed == Some(uid) {
                    guard.unclaimed = None;
                    true
                } else {
                    guard.current = Some((uid, utterance.id));
                    false
                }
            }
            Err(_) => false,
        };
        if already_done {
            self.events.emit(SpeechEvent::UtteranceEnded(utterance.id));
        }

        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        if let Ok(mut guard) = self.tracker.lock() {
            guard.current = None;
        }
        if !self.features.stop {
            return Ok(());
        }
        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            QuizError::Speech(format!("Cancel failed: {}", e))
        })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
