//! Configuration management
//!
//! Settings live in an INI file (`~/.kidspeak.cfg` by default) that is
//! created with defaults on first run. Typed views over the raw INI are
//! handed to the quiz loop and the speech backends.

use crate::{QuizError, Result};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default attempts per question
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Pause between the end of the question and the start of listening
pub const DEFAULT_LISTEN_DELAY_MS: u64 = 500;
/// How long success feedback stays up before advancing
pub const DEFAULT_SUCCESS_DELAY_MS: u64 = 3000;
/// How long the revealed answer stays up before advancing
pub const DEFAULT_FAIL_DELAY_MS: u64 = 4000;
/// How long "try again" feedback stays up before the next round
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;
/// Recognition locale
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Which text-to-speech backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputBackend {
    /// Pick the best available for the platform
    Auto,
    /// The `tts` crate (Speech Dispatcher, AVFoundation, SAPI)
    Native,
    /// espeak-ng subprocesses
    Espeak,
    /// No speech output
    Silent,
}

impl OutputBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "native" => Some(Self::Native),
            "espeak" | "espeak-ng" => Some(Self::Espeak),
            "silent" | "none" | "off" => Some(Self::Silent),
            _ => None,
        }
    }
}

/// Which speech recognizer to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBackend {
    /// Answers typed on the console
    Typed,
    /// External recognizer program
    Command,
    /// No recognition; every capture fails
    None,
}

impl InputBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "typed" | "keyboard" => Some(Self::Typed),
            "command" => Some(Self::Command),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

/// Timing and attempt settings for the question loop
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    pub max_attempts: u32,
    pub auto_listen: bool,
    pub listen_delay: Duration,
    pub success_delay: Duration,
    pub fail_delay: Duration,
    pub retry_delay: Duration,
    pub language: String,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            auto_listen: true,
            listen_delay: Duration::from_millis(DEFAULT_LISTEN_DELAY_MS),
            success_delay: Duration::from_millis(DEFAULT_SUCCESS_DELAY_MS),
            fail_delay: Duration::from_millis(DEFAULT_FAIL_DELAY_MS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Speech output settings
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub backend: OutputBackend,
    /// Preferred voice name, tried before the built-in preferences
    pub voice: Option<String>,
    /// Volume 0-100
    pub volume: Option<u8>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            backend: OutputBackend::Auto,
            voice: None,
            volume: None,
        }
    }
}

/// Speech input settings
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSettings {
    pub backend: InputBackend,
    /// Recognizer command line; `{language}` is substituted
    pub command: Option<String>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            backend: InputBackend::Typed,
            command: None,
        }
    }
}

/// Application configuration backed by an INI file
pub struct Config {
    ini: Ini,
    path: PathBuf,
}

impl Config {
    /// Load configuration from `~/.kidspeak.cfg`, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific file, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(path)
                .map_err(|e| QuizError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default at {:?}", path);
            let default = Self::default_config();
            default
                .write_to_file(path)
                .map_err(|e| QuizError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self {
            ini,
            path: path.to_path_buf(),
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| QuizError::Config(format!("Failed to save config: {}", e)))
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kidspeak.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("quiz"))
            .set("max_attempts", DEFAULT_MAX_ATTEMPTS.to_string())
            .set("auto_listen", "true");

        ini.with_section(Some("timing"))
            .set("listen_delay_ms", DEFAULT_LISTEN_DELAY_MS.to_string())
            .set("success_delay_ms", DEFAULT_SUCCESS_DELAY_MS.to_string())
            .set("fail_delay_ms", DEFAULT_FAIL_DELAY_MS.to_string())
            .set("retry_delay_ms", DEFAULT_RETRY_DELAY_MS.to_string());

        ini.with_section(Some("speech")).set("backend", "auto");

        ini.with_section(Some("recognition"))
            .set("backend", "typed")
            .set("language", DEFAULT_LANGUAGE);

        ini.with_section(Some("celebration"));

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a non-empty string value, if present
    pub fn get_optional(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get_from(Some(section), key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Get an unsigned integer value from config
    pub fn get_u64(&self, section: &str, key: &str, default: u64) -> u64 {
        match self.ini.get_from(Some(section), key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid number for {}.{}: {:?}, using {}", section, key, raw, default);
                default
            }),
            None => default,
        }
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    fn millis(&self, key: &str, default: u64) -> Duration {
        Duration::from_millis(self.get_u64("timing", key, default))
    }

    /// Attempt and timing settings for the question loop
    pub fn quiz_settings(&self) -> QuizSettings {
        let max_attempts = self
            .get_u64("quiz", "max_attempts", DEFAULT_MAX_ATTEMPTS as u64)
            .clamp(1, u32::MAX as u64) as u32;

        QuizSettings {
            max_attempts,
            auto_listen: self.get_bool("quiz", "auto_listen", true),
            listen_delay: self.millis("listen_delay_ms", DEFAULT_LISTEN_DELAY_MS),
            success_delay: self.millis("success_delay_ms", DEFAULT_SUCCESS_DELAY_MS),
            fail_delay: self.millis("fail_delay_ms", DEFAULT_FAIL_DELAY_MS),
            retry_delay: self.millis("retry_delay_ms", DEFAULT_RETRY_DELAY_MS),
            language: self.get_string("recognition", "language", DEFAULT_LANGUAGE),
        }
    }

    /// Speech output settings
    pub fn speech_settings(&self) -> SpeechSettings {
        let raw = self.get_string("speech", "backend", "auto");
        let backend = OutputBackend::parse(&raw).unwrap_or_else(|| {
            warn!("Unknown speech backend {:?}, using auto", raw);
            OutputBackend::Auto
        });

        SpeechSettings {
            backend,
            voice: self.get_optional("speech", "voice"),
            volume: self
                .get_optional("speech", "volume")
                .and_then(|v| v.parse::<u8>().ok())
                .filter(|&v| v <= 100),
        }
    }

    /// Speech input settings
    pub fn recognition_settings(&self) -> RecognitionSettings {
        let raw = self.get_string("recognition", "backend", "typed");
        let backend = InputBackend::parse(&raw).unwrap_or_else(|| {
            warn!("Unknown recognition backend {:?}, using typed", raw);
            InputBackend::Typed
        });

        RecognitionSettings {
            backend,
            command: self.get_optional("recognition", "command"),
        }
    }

    /// Celebration sound file, if configured
    pub fn celebration_sound(&self) -> Option<PathBuf> {
        self.get_optional("celebration", "sound").map(PathBuf::from)
    }

    /// Question file replacing the built-in levels, if configured
    pub fn questions_path(&self) -> Option<PathBuf> {
        self.get_optional("quiz", "questions").map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(OutputBackend::parse("Native"), Some(OutputBackend::Native));
        assert_eq!(OutputBackend::parse("espeak-ng"), Some(OutputBackend::Espeak));
        assert_eq!(OutputBackend::parse("off"), Some(OutputBackend::Silent));
        assert_eq!(OutputBackend::parse("loud"), None);

        assert_eq!(InputBackend::parse("command"), Some(InputBackend::Command));
        assert_eq!(InputBackend::parse(" keyboard "), Some(InputBackend::Typed));
        assert_eq!(InputBackend::parse("whisper"), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = QuizSettings::default();
        assert_eq!(settings.max_attempts, 3);
        assert!(settings.auto_listen);
        assert_eq!(settings.listen_delay, Duration::from_millis(500));
        assert_eq!(settings.success_delay, Duration::from_millis(3000));
        assert_eq!(settings.fail_delay, Duration::from_millis(4000));
        assert_eq!(settings.retry_delay, Duration::from_millis(3000));
        assert_eq!(settings.language, "en-US");
    }
}
