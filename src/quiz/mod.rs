//! The question/answer loop
//!
//! `Orchestrator` sequences speaking, listening, judging and feedback;
//! the other modules are its small collaborators.

pub mod attempts;
pub mod celebration;
pub mod evaluator;
pub mod feedback;
pub mod orchestrator;
pub mod timer;

pub use attempts::AttemptTracker;
pub use celebration::{AudioCue, NoCue, SoundFileCue};
pub use evaluator::is_correct;
pub use feedback::{Feedback, FeedbackKind, Miss};
pub use orchestrator::{DisplayState, HostEvent, Orchestrator, Phase};
pub use timer::{Clock, ManualClock, Scheduler, SystemClock, TimerAction};
