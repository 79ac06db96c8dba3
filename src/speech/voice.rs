//! Voice preference cascade
//!
//! Purely cosmetic: picks a friendly voice from whatever the engine
//! offers. Each rule is tried against the full voice list in order and
//! the first rule with a match wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// Voices known to sound friendly on common platforms
pub const FALLBACK_VOICE_NAMES: &[&str] = &[
    "Samantha",
    "Google US English",
    "Microsoft Zira",
    "Karen",
    "Victoria",
    "Tessa",
];

static FEMALE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfemale\b").expect("valid female label regex"));

/// What the cascade needs to know about an engine voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// Engine reports the voice as female
    pub female: bool,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, female: bool) -> Self {
        Self {
            name: name.into(),
            female,
        }
    }
}

type Rule<'a> = Box<dyn Fn(&VoiceInfo) -> bool + 'a>;

/// Pick a voice index, or None to keep the engine default
pub fn select_voice(voices: &[VoiceInfo], preferred: Option<&str>) -> Option<usize> {
    let mut rules: Vec<Rule<'_>> = Vec::new();

    if let Some(wanted) = preferred {
        let wanted = wanted.to_lowercase();
        rules.push(Box::new(move |v: &VoiceInfo| v.name.to_lowercase() == wanted));
    }
    rules.push(Box::new(|v: &VoiceInfo| FEMALE_LABEL.is_match(&v.name) || v.female));
    for fallback in FALLBACK_VOICE_NAMES {
        let fallback = fallback.to_lowercase();
        rules.push(Box::new(move |v: &VoiceInfo| {
            v.name.to_lowercase().contains(&fallback)
        }));
    }

    rules
        .iter()
        .find_map(|rule| voices.iter().position(|v| rule(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Alex", false),
            VoiceInfo::new("Samantha", false),
            VoiceInfo::new("English (America) Female", false),
            VoiceInfo::new("Fred", false),
        ]
    }

    #[test]
    fn test_preferred_name_wins() {
        assert_eq!(select_voice(&voices(), Some("fred")), Some(3));
    }

    #[test]
    fn test_female_label_before_fallback_names() {
        assert_eq!(select_voice(&voices(), None), Some(2));
        // Unknown preference falls through to the next rule
        assert_eq!(select_voice(&voices(), Some("Nobody")), Some(2));
    }

    #[test]
    fn test_gender_flag_counts_as_female() {
        let list = vec![VoiceInfo::new("Alex", false), VoiceInfo::new("Kathy", true)];
        assert_eq!(select_voice(&list, None), Some(1));
    }

    #[test]
    fn test_fallback_names() {
        let list = vec![
            VoiceInfo::new("Alex", false),
            VoiceInfo::new("Microsoft Zira Desktop", false),
        ];
        assert_eq!(select_voice(&list, None), Some(1));
    }

    #[test]
    fn test_female_word_boundary() {
        // "Females" style substrings are not labels
        let list = vec![VoiceInfo::new("femalesque", false)];
        assert_eq!(select_voice(&list, None), None);
    }

    #[test]
    fn test_no_match_keeps_default() {
        let list = vec![VoiceInfo::new("Alex", false), VoiceInfo::new("Fred", false)];
        assert_eq!(select_voice(&list, None), None);
        assert_eq!(select_voice(&[], Some("Alex")), None);
    }
}
