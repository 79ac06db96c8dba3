//! Question sets
//!
//! A level is an ordered list of picture questions. The built-in levels
//! can be replaced by a JSON file:
//!
//! ```text
//! {"levels": [{"name": "Beginner",
//!              "questions": [{"prompt": "What animal is this?",
//!                             "answer": "cat",
//!                             "image": "beginner/cat.jpg"}]}]}
//! ```

use crate::{QuizError, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One picture question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Read aloud and shown under the picture
    pub prompt: String,
    /// Expected answer, matched case-insensitively
    pub answer: String,
    /// Picture shown with the question
    #[serde(default)]
    pub image: String,
}

impl Question {
    pub fn new(prompt: &str, answer: &str, image: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            image: image.to_string(),
        }
    }
}

/// An ordered, non-empty list of questions for one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub questions: Vec<Question>,
}

impl Level {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionFile {
    levels: Vec<Level>,
}

/// All levels available to pick from
#[derive(Debug, Clone)]
pub struct QuestionBank {
    levels: Vec<Arc<Level>>,
}

static BUILTIN: Lazy<QuestionBank> = Lazy::new(|| {
    let level = |name: &str, questions: Vec<Question>| Level {
        name: name.to_string(),
        questions,
    };

    QuestionBank {
        levels: vec![
            Arc::new(level(
                "Beginner",
                vec![
                    Question::new("What animal is this?", "cat", "beginner/cat.jpg"),
                    Question::new("What color is this?", "red", "beginner/red.jpg"),
                    Question::new("What shape is this?", "circle", "beginner/circle.jpg"),
                ],
            )),
            Arc::new(level(
                "Intermediate",
                vec![
                    Question::new(
                        "What are these animals called?",
                        "elephants",
                        "intermediate/elephants.jpg",
                    ),
                    Question::new("What season is shown?", "winter", "intermediate/winter.jpg"),
                    Question::new(
                        "How many birds are in this picture?",
                        "three",
                        "intermediate/birds.jpg",
                    ),
                ],
            )),
            Arc::new(level(
                "Expert",
                vec![
                    Question::new("What is this animal's habitat?", "ocean", "expert/ocean.jpg"),
                    Question::new("What is the capital city shown?", "paris", "expert/paris.jpg"),
                    Question::new("What planet is this?", "saturn", "expert/saturn.jpg"),
                ],
            )),
        ],
    }
});

impl QuestionBank {
    /// The levels shipped with the program
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Load levels from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Loading questions from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&contents)?;
        info!("Loaded {} levels from {:?}", bank.levels.len(), path);
        Ok(bank)
    }

    /// Parse levels from JSON text
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: QuestionFile = serde_json::from_str(contents)?;
        Self::from_levels(file.levels)
    }

    /// Build a bank, rejecting empty levels and blank answers
    pub fn from_levels(levels: Vec<Level>) -> Result<Self> {
        if levels.is_empty() {
            return Err(QuizError::Questions("no levels defined".to_string()));
        }
        for level in &levels {
            if level.is_empty() {
                return Err(QuizError::Questions(format!(
                    "level {:?} has no questions",
                    level.name
                )));
            }
            if let Some(q) = level.questions.iter().find(|q| q.answer.trim().is_empty()) {
                return Err(QuizError::Questions(format!(
                    "question {:?} in level {:?} has no answer",
                    q.prompt, level.name
                )));
            }
        }

        Ok(Self {
            levels: levels.into_iter().map(Arc::new).collect(),
        })
    }

    /// Level names in display order
    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.name.as_str()).collect()
    }

    /// Look up a level by name, ignoring case
    pub fn level(&self, name: &str) -> Option<Arc<Level>> {
        let wanted = name.trim().to_lowercase();
        self.levels
            .iter()
            .find(|l| l.name.to_lowercase() == wanted)
            .cloned()
    }

    /// Look up a level by its 1-based menu number
    pub fn level_by_number(&self, number: usize) -> Option<Arc<Level>> {
        number
            .checked_sub(1)
            .and_then(|idx| self.levels.get(idx))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Where a question stands relative to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMark {
    Completed,
    Current,
    Pending,
}

/// Progress strip for a level ("mile view")
pub fn progress_marks(current: usize, total: usize) -> Vec<ProgressMark> {
    (0..total)
        .map(|idx| match idx.cmp(&current) {
            std::cmp::Ordering::Less => ProgressMark::Completed,
            std::cmp::Ordering::Equal => ProgressMark::Current,
            std::cmp::Ordering::Greater => ProgressMark::Pending,
        })
        .collect()
}
