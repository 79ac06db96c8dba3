//! espeak-ng backend
//!
//! Runs one `espeak-ng` process per utterance. A watcher thread waits on
//! the process and reports completion when it exits cleanly; cancelling
//! kills the process and suppresses the report.
//!
//! Under WSLg, audio goes through the PulseAudio server exposed at
//! /mnt/wslg/PulseServer.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::config::SpeechSettings;
use crate::platform::{has_program, is_wsl};
use crate::speech::events::{EventSender, OperationId, SpeechEvent};
use crate::speech::output::{Prosody, SpeechOutput, Utterance};
use crate::{QuizError, Result};
use log::{debug, error, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// espeak-ng's own default speed in words per minute
const BASE_SPEED_WPM: f32 = 175.0;
/// espeak-ng's default pitch (0-99)
const BASE_PITCH: f32 = 50.0;
/// A clear, gentle voice variant
const DEFAULT_VOICE: &str = "en-us+f3";

/// A running espeak-ng process
struct Running {
    pid: Pid,
    id: OperationId,
    cancelled: Arc<AtomicBool>,
}

/// espeak-ng speech output
pub struct EspeakOutput {
    espeak_path: String,
    voice: String,
    /// espeak amplitude (0-200)
    amplitude: u8,
    current: Option<Running>,
    events: EventSender,
}

impl EspeakOutput {
    /// Verify espeak-ng (and PulseAudio under WSL) is available
    pub fn new(settings: &SpeechSettings, events: EventSender) -> Result<Self> {
        debug!("Creating espeak-ng backend");

        Self::setup_pulseaudio()?;
        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            espeak_path,
            voice: settings
                .voice
                .clone()
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            amplitude: settings.volume.map(volume_to_amplitude).unwrap_or(100),
            current: None,
            events,
        })
    }

    /// Point PulseAudio clients at the WSLg server when needed
    fn setup_pulseaudio() -> Result<()> {
        const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

        if std::env::var("PULSE_SERVER").is_ok() {
            debug!("PULSE_SERVER already set via environment");
            return Ok(());
        }

        if std::path::Path::new(WSLG_PULSE_PATH).exists() {
            info!("Auto-detected WSLG PulseAudio server at {}", WSLG_PULSE_PATH);
            std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
            return Ok(());
        }

        if is_wsl() {
            warn!("WSLG PulseAudio server not found at {}", WSLG_PULSE_PATH);
            return Err(QuizError::Speech(
                "PulseAudio server not found. Install WSLg or set PULSE_SERVER.".to_string(),
            ));
        }

        Ok(())
    }

    fn find_espeak() -> Result<String> {
        ["espeak-ng", "/usr/bin/espeak-ng"]
            .into_iter()
            .find(|path| has_program(path))
            .map(str::to_string)
            .ok_or_else(|| {
                QuizError::Speech(
                    "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
                )
            })
    }

    fn stop_current(&mut self) {
        if let Some(running) = self.current.take() {
            running.cancelled.store(true, Ordering::SeqCst);
            debug!("Killing espeak-ng process for {}", running.id);
            match kill(running.pid, Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => debug!("Failed to kill espeak-ng process: {}", e),
            }
        }
    }
}

/// Prosody rate multiplier to espeak words per minute
fn rate_to_speed(rate: f32) -> u16 {
    (BASE_SPEED_WPM * rate).clamp(80.0, 450.0).round() as u16
}

/// Prosody pitch multiplier to espeak pitch (0-99)
fn pitch_to_espeak(pitch: f32) -> u8 {
    (BASE_PITCH * pitch).clamp(0.0, 99.0).round() as u8
}

/// Volume (0-100) to espeak amplitude (0-200)
fn volume_to_amplitude(volume: u8) -> u8 {
    ((volume.min(100) as u16 * 200) / 100) as u8
}

fn espeak_args(voice: &str, amplitude: u8, prosody: Prosody, text: &str) -> Vec<String> {
    vec![
        "-v".to_string(),
        voice.to_string(),
        "-s".to_string(),
        rate_to_speed(prosody.rate).to_string(),
        "-p".to_string(),
        pitch_to_espeak(prosody.pitch).to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--".to_string(),
        text.to_string(),
    ]
}

impl SpeechOutput for EspeakOutput {
    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        self.stop_current();

        if utterance.text.is_empty() {
            return Ok(());
        }

        debug!("Speaking ({}): {}", utterance.id, utterance.text);
        let mut child = Command::new(&self.espeak_path)
            .args(espeak_args(
                &self.voice,
                self.amplitude,
                utterance.prosody,
                &utterance.text,
            ))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn espeak-ng: {}", e);
                QuizError::Speech(format!("Failed to start espeak-ng: {}", e))
            })?;

        let cancelled = Arc::new(AtomicBool::new(false));
        self.current = Some(Running {
            pid: Pid::from_raw(child.id() as i32),
            id: utterance.id,
            cancelled: Arc::clone(&cancelled),
        });

        let events = self.events.clone();
        let id = utterance.id;
        thread::spawn(move || match child.wait() {
            Ok(status) if cancelled.load(Ordering::SeqCst) => {
                debug!("espeak-ng for {} cancelled ({})", id, status);
            }
            Ok(status) if status.success() => events.emit(SpeechEvent::UtteranceEnded(id)),
            Ok(status) => warn!("espeak-ng exited with {}", status),
            Err(e) => warn!("Failed to wait for espeak-ng: {}", e),
        });

        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.stop_current();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}

impl Drop for EspeakOutput {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng backend");
        self.stop_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_conversion() {
        assert_eq!(rate_to_speed(1.0), 175);
        assert_eq!(rate_to_speed(2.0), 350);
        assert_eq!(rate_to_speed(0.1), 80);
        assert_eq!(rate_to_speed(10.0), 450);
    }

    #[test]
    fn test_pitch_conversion() {
        assert_eq!(pitch_to_espeak(1.0), 50);
        assert_eq!(pitch_to_espeak(1.2), 60);
        assert_eq!(pitch_to_espeak(3.0), 99);
    }

    #[test]
    fn test_volume_conversion() {
        assert_eq!(volume_to_amplitude(0), 0);
        assert_eq!(volume_to_amplitude(50), 100);
        assert_eq!(volume_to_amplitude(100), 200);
        assert_eq!(volume_to_amplitude(255), 200);
    }

    #[test]
    fn test_args_end_options_before_text() {
        let args = espeak_args("en", 100, Prosody::NORMAL, "-dash first");
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "-dash first");
    }

    #[test]
    fn test_create_espeak_output() {
        let (events, _rx) = crate::speech::events::channel();
        match EspeakOutput::new(&SpeechSettings::default(), events) {
            Ok(_) => println!("✓ espeak-ng backend available"),
            Err(e) => println!("⚠ espeak-ng backend not available: {}", e),
        }
    }
}
