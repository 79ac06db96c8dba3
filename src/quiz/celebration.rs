//! Celebration sound for correct answers
//!
//! Playing the cue is best effort. When it fails the orchestrator says
//! a congratulation instead.

use crate::speech::Prosody;
use crate::{QuizError, Result};
use log::debug;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Voice used for the spoken fallback
pub const CELEBRATION_PROSODY: Prosody = Prosody::new(1.4, 1.1);

/// A short sound played on success
pub trait AudioCue {
    /// Start playing; an error means nothing will be heard
    fn play(&mut self) -> Result<()>;
}

/// Used when no sound file is configured
pub struct NoCue;

impl AudioCue for NoCue {
    fn play(&mut self) -> Result<()> {
        Err(QuizError::Audio("no celebration sound configured".to_string()))
    }
}

/// Plays a sound file through the default output device
pub struct SoundFileCue {
    path: PathBuf,
    /// Opened on first use and kept; dropping the stream stops playback
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl SoundFileCue {
    pub fn new(path: PathBuf) -> Self {
        Self { path, stream: None }
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle> {
        if self.stream.is_none() {
            let opened = OutputStream::try_default()
                .map_err(|e| QuizError::Audio(format!("No audio output: {}", e)))?;
            self.stream = Some(opened);
        }
        match self.stream {
            Some((_, ref handle)) => Ok(handle),
            None => Err(QuizError::Audio("audio output not open".to_string())),
        }
    }
}

impl AudioCue for SoundFileCue {
    fn play(&mut self) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| {
            QuizError::Audio(format!("Cannot open {}: {}", self.path.display(), e))
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| {
            QuizError::Audio(format!("Cannot decode {}: {}", self.path.display(), e))
        })?;

        let sink = Sink::try_new(self.handle()?)
            .map_err(|e| QuizError::Audio(format!("Cannot start playback: {}", e)))?;
        sink.append(source);
        sink.detach();

        debug!("Playing celebration sound {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cue_fails() {
        assert!(matches!(NoCue.play(), Err(QuizError::Audio(_))));
    }

    #[test]
    fn test_missing_file_fails() {
        let mut cue = SoundFileCue::new(PathBuf::from("/nonexistent/celebration.mp3"));
        match cue.play() {
            Err(QuizError::Audio(msg)) => assert!(msg.contains("Cannot open")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
