//! Feedback messages shown and spoken to the child

/// How a feedback message is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Listening,
    Warning,
}

impl FeedbackKind {
    /// Classify a message by its wording
    pub fn classify(text: &str) -> Self {
        if text.contains("Hurray") || text.contains("Great") {
            FeedbackKind::Success
        } else if text.contains("listening") {
            FeedbackKind::Listening
        } else {
            FeedbackKind::Warning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Success => "success",
            FeedbackKind::Listening => "listening",
            FeedbackKind::Warning => "warning",
        }
    }
}

/// A transient feedback message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub kind: FeedbackKind,
}

impl Feedback {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = FeedbackKind::classify(&text);
        Self { text, kind }
    }
}

/// What went wrong with an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// Heard something that wasn't the answer
    Wrong(String),
    /// Nothing usable was heard
    NotHeard,
}

pub const LISTENING: &str = "I'm listening... Please say your answer!";
pub const CELEBRATION: &str = "Hurray! You got it right!";

pub fn success(transcript: &str) -> String {
    format!("Hurray! \"{}\" is correct!", transcript)
}

fn attempts_left(remaining: u32) -> String {
    if remaining == 1 {
        "You have 1 attempt left.".to_string()
    } else {
        format!("You have {} attempts left.", remaining)
    }
}

/// Message for a missed attempt with attempts to spare
pub fn retry(miss: &Miss, remaining: u32) -> String {
    match miss {
        Miss::Wrong(heard) => format!(
            "I heard \"{}\". Try again! {}",
            heard,
            attempts_left(remaining)
        ),
        Miss::NotHeard => format!(
            "I didn't hear an answer. Try again! {}",
            attempts_left(remaining)
        ),
    }
}

/// Message for the last missed attempt, revealing the answer
pub fn reveal(miss: &Miss, answer: &str) -> String {
    match miss {
        Miss::Wrong(heard) => format!(
            "I heard \"{}\". Let's try the next question. The correct answer was \"{}\".",
            heard, answer
        ),
        Miss::NotHeard => format!(
            "Sorry, I couldn't hear you. Let's try the next question. The correct answer was \"{}\".",
            answer
        ),
    }
}

pub fn level_complete(level: &str) -> String {
    format!("Great job! You finished the {} level!", level)
}
