//! Configuration loading tests
//!
//! Tests that quiz configuration is created with defaults, read back
//! from disk, and tolerant of bad values

use kidspeak::config::{Config, InputBackend, OutputBackend, QuizSettings};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidspeak.cfg");

    let config = Config::load_from(&path).expect("Failed to load config");
    assert!(path.exists(), "default config should be written");
    assert_eq!(config.path(), path.as_path());

    // Defaults match the built-in quiz settings
    assert_eq!(config.quiz_settings(), QuizSettings::default());
    assert_eq!(config.speech_settings().backend, OutputBackend::Auto);
    assert_eq!(config.recognition_settings().backend, InputBackend::Typed);
    assert!(config.celebration_sound().is_none());
    assert!(config.questions_path().is_none());
}

#[test]
fn test_config_reads_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidspeak.cfg");
    fs::write(
        &path,
        "[quiz]\n\
         max_attempts=5\n\
         auto_listen=false\n\
         [timing]\n\
         listen_delay_ms=250\n\
         fail_delay_ms=6000\n\
         [speech]\n\
         backend=espeak\n\
         voice=Karen\n\
         volume=80\n\
         [recognition]\n\
         backend=command\n\
         language=en-GB\n\
         command=my-recognizer --lang {language}\n\
         [celebration]\n\
         sound=/tmp/yay.wav\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();

    let quiz = config.quiz_settings();
    assert_eq!(quiz.max_attempts, 5);
    assert!(!quiz.auto_listen);
    assert_eq!(quiz.listen_delay, Duration::from_millis(250));
    assert_eq!(quiz.fail_delay, Duration::from_millis(6000));
    // Unset values keep their defaults
    assert_eq!(quiz.success_delay, Duration::from_millis(3000));
    assert_eq!(quiz.language, "en-GB");

    let speech = config.speech_settings();
    assert_eq!(speech.backend, OutputBackend::Espeak);
    assert_eq!(speech.voice.as_deref(), Some("Karen"));
    assert_eq!(speech.volume, Some(80));

    let recognition = config.recognition_settings();
    assert_eq!(recognition.backend, InputBackend::Command);
    assert_eq!(
        recognition.command.as_deref(),
        Some("my-recognizer --lang {language}")
    );

    assert_eq!(
        config.celebration_sound().unwrap().to_str(),
        Some("/tmp/yay.wav")
    );
}

#[test]
fn test_invalid_values_fall_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidspeak.cfg");
    fs::write(
        &path,
        "[quiz]\nmax_attempts=0\n[timing]\nretry_delay_ms=soon\n[speech]\nbackend=loud\nvolume=300\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    let quiz = config.quiz_settings();
    assert_eq!(quiz.max_attempts, 1, "max_attempts is clamped to at least one");
    assert_eq!(quiz.retry_delay, Duration::from_millis(3000));

    let speech = config.speech_settings();
    assert_eq!(speech.backend, OutputBackend::Auto);
    assert_eq!(speech.volume, None);
}

#[test]
fn test_config_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidspeak.cfg");

    let mut config = Config::load_from(&path).unwrap();
    config.set("quiz", "auto_listen", "false");
    config.save().unwrap();

    let reloaded = Config::load_from(&path).unwrap();
    assert!(!reloaded.get_bool("quiz", "auto_listen", true));
}
