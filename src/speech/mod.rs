//! Speech output and input services
//!
//! The quiz loop talks to speech only through the `SpeechOutput` and
//! `SpeechInput` traits; backends report back with `SpeechEvent`s.

pub mod backends;
pub mod events;
pub mod input;
pub mod output;
pub mod voice;

pub use events::{EventSender, OperationId, SpeechEvent};
pub use input::{create_input, ListenRequest, SpeechInput, UnavailableInput};
pub use output::{create_output, Prosody, SilentOutput, SpeechOutput, Utterance};
