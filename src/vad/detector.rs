//! Detector trait and test double.

use crate::error::{Result, ScribedError};

/// A span of detected speech within one window.
///
/// Offsets are in seconds relative to the window start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechSpan {
    pub start: f64,
    pub end: f64,
}

impl SpeechSpan {
    /// Creates a span covering `start..end` seconds.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Span length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Trait for voice activity detection.
///
/// This trait allows swapping implementations (energy scan vs mock).
pub trait VoiceActivityDetector: Send + Sync {
    /// Detect spans of speech in a window of samples.
    ///
    /// # Arguments
    /// * `samples` - Audio samples as 16-bit PCM
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// Speech spans in seconds relative to the window start; empty when the
    /// window is silence.
    fn detect(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<SpeechSpan>>;
}

/// Mock detector for testing
#[derive(Debug, Clone, Default)]
pub struct MockVad {
    spans: Vec<SpeechSpan>,
    should_fail: bool,
}

impl MockVad {
    /// Create a mock that reports no speech.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Configure the mock to return specific spans.
    pub fn with_spans(mut self, spans: Vec<SpeechSpan>) -> Self {
        self.spans = spans;
        self
    }

    /// Configure the mock to fail on detect.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl VoiceActivityDetector for MockVad {
    fn detect(&self, _samples: &[i16], _sample_rate: u32) -> Result<Vec<SpeechSpan>> {
        if self.should_fail {
            Err(ScribedError::Other("mock vad failure".to_string()))
        } else {
            Ok(self.spans.clone())
        }
    }
}
