//! RMS-energy voice activity detection.
//!
//! Scans a window in short frames, marks frames whose RMS exceeds the
//! threshold as speech, and merges nearby speech frames into spans so brief
//! pauses between words do not split an utterance.

use crate::defaults;
use crate::error::Result;
use crate::vad::detector::{SpeechSpan, VoiceActivityDetector};

/// Configuration for the energy detector.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVadConfig {
    /// RMS threshold for detecting speech (0.0 to 1.0).
    pub speech_threshold: f32,
    /// Analysis frame length in milliseconds.
    pub frame_ms: u32,
    /// Maximum silent gap bridged inside one span, in milliseconds.
    pub hangover_ms: u32,
}

impl Default for EnergyVadConfig {
    fn default() -> Self {
        Self {
            speech_threshold: defaults::VAD_THRESHOLD,
            frame_ms: defaults::VAD_FRAME_MS,
            hangover_ms: defaults::VAD_HANGOVER_MS,
        }
    }
}

/// RMS-based voice activity detector.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVad {
    config: EnergyVadConfig,
}

impl EnergyVad {
    /// Creates a detector with the given configuration.
    pub fn new(config: EnergyVadConfig) -> Self {
        Self { config }
    }
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new(EnergyVadConfig::default())
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn detect(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<SpeechSpan>> {
        if samples.is_empty() || sample_rate == 0 {
            return Ok(Vec::new());
        }

        let frame_len = ((sample_rate * self.config.frame_ms) / 1000).max(1) as usize;
        let hangover_frames = (self.config.hangover_ms / self.config.frame_ms.max(1)) as usize;
        let frame_secs = frame_len as f64 / sample_rate as f64;

        let mut spans: Vec<SpeechSpan> = Vec::new();
        let mut span_start: Option<usize> = None;
        let mut last_speech_frame = 0usize;

        let frame_count = samples.len().div_ceil(frame_len);
        for index in 0..frame_count {
            let lo = index * frame_len;
            let hi = (lo + frame_len).min(samples.len());
            let is_speech = calculate_rms(&samples[lo..hi]) > self.config.speech_threshold;

            match (span_start, is_speech) {
                (None, true) => {
                    span_start = Some(index);
                    last_speech_frame = index;
                }
                (Some(_), true) => {
                    last_speech_frame = index;
                }
                (Some(start), false) => {
                    if index - last_speech_frame > hangover_frames {
                        spans.push(SpeechSpan::new(
                            start as f64 * frame_secs,
                            (last_speech_frame + 1) as f64 * frame_secs,
                        ));
                        span_start = None;
                    }
                }
                (None, false) => {}
            }
        }

        if let Some(start) = span_start {
            let end_secs =
                ((last_speech_frame + 1) as f64 * frame_secs).min(samples.len() as f64 / sample_rate as f64);
            spans.push(SpeechSpan::new(start as f64 * frame_secs, end_secs));
        }

        Ok(spans)
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_silence(count: usize) -> Vec<i16> {
        vec![0i16; count]
    }

    fn make_speech(count: usize, amplitude: i16) -> Vec<i16> {
        vec![amplitude; count]
    }

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(calculate_rms(&make_silence(1000)), 0.0);
    }

    #[test]
    fn test_rms_max_amplitude() {
        let rms = calculate_rms(&make_speech(1000, i16::MAX));
        assert!((rms - 1.0).abs() < 0.001, "RMS should be ~1.0, got {}", rms);
    }

    #[test]
    fn test_rms_negative_samples() {
        let rms = calculate_rms(&make_speech(1000, i16::MIN));
        assert!(rms > 0.99, "RMS should be ~1.0 for i16::MIN, got {}", rms);
    }

    #[test]
    fn test_rms_empty_samples() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn test_silence_yields_no_spans() {
        let vad = EnergyVad::default();
        // 1 second of silence at 16kHz
        let spans = vad.detect(&make_silence(16_000), 16_000).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_continuous_speech_is_one_span() {
        let vad = EnergyVad::default();
        let spans = vad.detect(&make_speech(16_000, 3000), 16_000).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0.0);
        assert!((spans[0].end - 1.0).abs() < 0.05, "end was {}", spans[0].end);
    }

    #[test]
    fn test_speech_after_silence_starts_late() {
        let vad = EnergyVad::default();
        // 0.5s silence then 0.5s speech
        let mut samples = make_silence(8_000);
        samples.extend(make_speech(8_000, 3000));
        let spans = vad.detect(&samples, 16_000).unwrap();

        assert_eq!(spans.len(), 1);
        assert!((spans[0].start - 0.5).abs() < 0.05, "start was {}", spans[0].start);
        assert!((spans[0].end - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_short_pause_is_bridged() {
        let vad = EnergyVad::new(EnergyVadConfig {
            speech_threshold: 0.02,
            frame_ms: 30,
            hangover_ms: 300,
        });
        // speech, 100ms pause, speech → one span
        let mut samples = make_speech(4_800, 3000);
        samples.extend(make_silence(1_600));
        samples.extend(make_speech(4_800, 3000));
        let spans = vad.detect(&samples, 16_000).unwrap();

        assert_eq!(spans.len(), 1, "short pause should not split the span");
    }

    #[test]
    fn test_long_pause_splits_spans() {
        let vad = EnergyVad::new(EnergyVadConfig {
            speech_threshold: 0.02,
            frame_ms: 30,
            hangover_ms: 90,
        });
        // speech, 600ms pause, speech → two spans
        let mut samples = make_speech(4_800, 3000);
        samples.extend(make_silence(9_600));
        samples.extend(make_speech(4_800, 3000));
        let spans = vad.detect(&samples, 16_000).unwrap();

        assert_eq!(spans.len(), 2, "long pause should split spans");
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_empty_window_yields_no_spans() {
        let vad = EnergyVad::default();
        assert!(vad.detect(&[], 16_000).unwrap().is_empty());
    }

    #[test]
    fn test_spans_stay_inside_window() {
        let vad = EnergyVad::default();
        // Window shorter than one frame
        let spans = vad.detect(&make_speech(100, 3000), 16_000).unwrap();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].end <= 100.0 / 16_000.0 + 1e-9);
    }
}
