use crate::error::{Result, ScribedError};

/// Options for one inference call.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Language hint; None lets the model detect the language.
    pub language: Option<String>,
    /// Beam size; 1 falls back to greedy decoding.
    pub beam_size: usize,
}

/// Word with timestamps and recognizer confidence.
///
/// Offsets are in seconds relative to the start of the transcribed audio.
#[derive(Debug, Clone, PartialEq)]
pub struct WordInfo {
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub probability: f64,
}

/// One timestamped segment of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    /// Word-level timestamps when the backend provides them.
    pub words: Vec<WordInfo>,
}

impl Segment {
    /// Creates a segment without word-level timestamps.
    pub fn new(text: &str, start: f64, end: f64) -> Self {
        Self {
            text: text.to_string(),
            start,
            end,
            words: Vec::new(),
        }
    }

    /// Attaches word-level timestamps.
    pub fn with_words(mut self, words: Vec<WordInfo>) -> Self {
        self.words = words;
        self
    }
}

/// Full result of one inference call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    /// Detected (or forced) language code.
    pub language: String,
}

impl Transcription {
    /// Concatenated text of all segments, trimmed.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            text.push_str(&segment.text);
        }
        text.trim().to_string()
    }
}

/// Trait for speech-to-text recognition.
///
/// This trait allows swapping implementations (real Whisper vs mock).
/// Implementations block; callers run them on the blocking thread pool.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe audio samples to timestamped segments.
    ///
    /// # Arguments
    /// * `audio` - Samples as f32 normalized to [-1.0, 1.0], 16kHz mono
    /// * `options` - Language hint and decoding parameters
    fn transcribe(&self, audio: &[f32], options: &DecodeOptions) -> Result<Transcription>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the recognizer is ready
    fn is_ready(&self) -> bool;
}

/// Mock recognizer for testing
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    model_name: String,
    transcription: Transcription,
    should_fail: bool,
    delay: Option<std::time::Duration>,
}

impl MockRecognizer {
    /// Create a new mock recognizer returning no segments.
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            transcription: Transcription {
                segments: Vec::new(),
                language: "en".to_string(),
            },
            should_fail: false,
            delay: None,
        }
    }

    /// Append a segment to the mock result.
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.transcription.segments.push(segment);
        self
    }

    /// Set the detected language of the mock result.
    pub fn with_language(mut self, language: &str) -> Self {
        self.transcription.language = language.to_string();
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to sleep before returning.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn transcribe(&self, _audio: &[f32], _options: &DecodeOptions) -> Result<Transcription> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            Err(ScribedError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.transcription.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
