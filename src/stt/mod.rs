//! Speech-to-text capability boundary.

pub mod recognizer;
pub mod whisper;

pub use recognizer::{
    DecodeOptions, MockRecognizer, Segment, SpeechRecognizer, Transcription, WordInfo,
};
pub use whisper::WhisperRecognizer;
