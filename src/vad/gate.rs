//! Gate between the audio buffer and the transcription pipeline.
//!
//! Decides which parts of a flushed window are worth spending inference on.
//! When the detector is unavailable or fails, the gate fails open and passes
//! the whole window through: transcribing silence is preferred over dropping
//! speech.

use crate::audio::AudioWindow;
use crate::vad::detector::{SpeechSpan, VoiceActivityDetector};
use std::sync::Arc;
use tracing::warn;

/// Wraps an optional detector with the session-level gating policy.
#[derive(Clone)]
pub struct VoiceActivityGate {
    detector: Option<Arc<dyn VoiceActivityDetector>>,
}

impl VoiceActivityGate {
    /// Creates a gate around the given detector.
    pub fn new(detector: Arc<dyn VoiceActivityDetector>) -> Self {
        Self {
            detector: Some(detector),
        }
    }

    /// Creates a gate with no detector; every window passes through whole.
    pub fn pass_through() -> Self {
        Self { detector: None }
    }

    /// Evaluates a window and returns the speech spans to transcribe.
    ///
    /// - `vad_enabled == false` bypasses the detector entirely.
    /// - A missing or failing detector degrades to the full window.
    /// - An empty result means the window is silence and must be discarded
    ///   without emitting anything.
    pub fn evaluate(&self, window: &AudioWindow, vad_enabled: bool) -> Vec<SpeechSpan> {
        if window.is_empty() {
            return Vec::new();
        }

        if !vad_enabled {
            return vec![full_span(window)];
        }

        let Some(detector) = &self.detector else {
            warn!("voice activity detector unavailable, passing full window");
            return vec![full_span(window)];
        };

        match detector.detect(&window.samples, window.sample_rate) {
            Ok(spans) => spans,
            Err(e) => {
                warn!(error = %e, "voice activity detection failed, passing full window");
                vec![full_span(window)]
            }
        }
    }
}

fn full_span(window: &AudioWindow) -> SpeechSpan {
    SpeechSpan::new(0.0, window.duration_secs())
}
