//! Transcription pipeline.
//!
//! Turns one speech span into an ordered sequence of result events: zero or
//! more cumulative `partial` events strictly before exactly one `final`
//! event. Inference is blocking and runs on the blocking thread pool behind
//! a shared semaphore, so one session's latency never stalls another
//! session's I/O loop and total concurrent inference stays bounded.

use crate::audio::{AudioWindow, pcm};
use crate::protocol::{ErrorKind, ServerMessage, WordTimestamp};
use crate::stt::recognizer::{DecodeOptions, SpeechRecognizer, Transcription};
use crate::vad::SpeechSpan;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error};

/// Shared worker pool feeding speech spans to recognizers.
#[derive(Clone)]
pub struct TranscriptionPipeline {
    workers: Arc<Semaphore>,
}

impl TranscriptionPipeline {
    /// Creates a pipeline allowing at most `max_concurrent` inference calls
    /// at a time across all sessions.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Transcribes one span of a window and emits the resulting events.
    ///
    /// A recognizer failure is reported as a `transcription_failed` event
    /// and never propagated: a failed span must not terminate the session.
    /// When `is_active` is cleared (session closing), pending work is
    /// skipped and finished results are discarded instead of delivered.
    pub async fn run_span(
        &self,
        recognizer: Arc<dyn SpeechRecognizer>,
        window: &AudioWindow,
        span: SpeechSpan,
        options: DecodeOptions,
        is_active: &AtomicBool,
        events: &mpsc::Sender<ServerMessage>,
    ) {
        let samples = slice_span(window, &span);
        if samples.is_empty() {
            return;
        }
        let audio = pcm::samples_to_f32(&samples);
        let span_offset = window.start + span.start;

        let Ok(permit) = self.workers.clone().acquire_owned().await else {
            return;
        };
        if !is_active.load(Ordering::SeqCst) {
            // Session closed while waiting for a worker
            return;
        }

        debug!(
            offset = span_offset,
            samples = audio.len(),
            model = recognizer.model_name(),
            "transcribing span"
        );

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            recognizer.transcribe(&audio, &options)
        })
        .await;

        if !is_active.load(Ordering::SeqCst) {
            // Result arrived for a closed session; discard it
            return;
        }

        match result {
            Ok(Ok(transcription)) => {
                emit_span_events(&transcription, span_offset, events).await;
            }
            Ok(Err(e)) => {
                error!(error = %e, "transcription failed for span");
                let _ = events
                    .send(ServerMessage::Error {
                        error: ErrorKind::TranscriptionFailed,
                        detail: Some(e.to_string()),
                    })
                    .await;
            }
            Err(e) => {
                error!(error = %e, "transcription task panicked");
                let _ = events
                    .send(ServerMessage::Error {
                        error: ErrorKind::TranscriptionFailed,
                        detail: Some(format!("transcription task panicked: {}", e)),
                    })
                    .await;
            }
        }
    }
}

/// Extracts the span's samples from its window, clamped to window bounds.
fn slice_span(window: &AudioWindow, span: &SpeechSpan) -> Vec<i16> {
    let rate = window.sample_rate as f64;
    let lo = ((span.start * rate) as usize).min(window.samples.len());
    let hi = ((span.end * rate).ceil() as usize).min(window.samples.len());
    window.samples[lo..hi].to_vec()
}

/// Emits the partial/final event sequence for one recognized span.
///
/// Timestamps are shifted by `offset` (the span's absolute position in the
/// session stream) so they are monotonic across spans.
async fn emit_span_events(
    transcription: &Transcription,
    offset: f64,
    events: &mpsc::Sender<ServerMessage>,
) {
    let full_text = transcription.text();
    if full_text.is_empty() {
        // Nothing transcribable: no events at all for this span
        return;
    }

    let mut cumulative = String::new();
    let mut words: Vec<WordTimestamp> = Vec::new();

    for segment in &transcription.segments {
        cumulative.push_str(&segment.text);
        let text = cumulative.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let _ = events
            .send(ServerMessage::Partial {
                text,
                timestamp: offset + segment.end,
            })
            .await;

        for word in &segment.words {
            words.push(WordTimestamp {
                word: word.word.clone(),
                start: offset + word.start,
                end: offset + word.end,
                probability: word.probability,
            });
        }
    }

    let start = transcription
        .segments
        .first()
        .map(|s| offset + s.start)
        .unwrap_or(offset);
    let end = words
        .last()
        .map(|w| w.end)
        .or_else(|| transcription.segments.last().map(|s| offset + s.end))
        .unwrap_or(offset);

    let _ = events
        .send(ServerMessage::Final {
            text: full_text,
            start,
            end,
            language: transcription.language.clone(),
            words,
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::recognizer::{MockRecognizer, Segment, WordInfo};

    fn make_window(samples: usize, start: f64) -> AudioWindow {
        AudioWindow {
            samples: vec![1000i16; samples],
            start,
            end: start + samples as f64 / 16_000.0,
            sample_rate: 16_000,
        }
    }

    fn active() -> AtomicBool {
        AtomicBool::new(true)
    }

    async fn collect(mut rx: mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_single_segment_emits_partial_then_final() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
            MockRecognizer::new("mock").with_segment(Segment::new("hello world", 0.0, 1.0)),
        );
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.0, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        let events = collect(rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ServerMessage::Partial { text, .. } if text == "hello world"));
        match &events[1] {
            ServerMessage::Final {
                text, start, end, ..
            } => {
                assert_eq!(text, "hello world");
                assert_eq!(*start, 0.0);
                assert_eq!(*end, 1.0);
            }
            other => panic!("Expected Final, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partials_are_cumulative() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
            MockRecognizer::new("mock")
                .with_segment(Segment::new(" one", 0.0, 0.5))
                .with_segment(Segment::new(" two", 0.5, 1.0)),
        );
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.0, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        let events = collect(rx).await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ServerMessage::Partial { text, .. } if text == "one"));
        assert!(matches!(&events[1], ServerMessage::Partial { text, .. } if text == "one two"));
        assert!(matches!(&events[2], ServerMessage::Final { text, .. } if text == "one two"));
    }

    #[tokio::test]
    async fn test_empty_transcription_emits_nothing() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(MockRecognizer::new("mock"));
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.0, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_emits_single_error_event() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> =
            Arc::new(MockRecognizer::new("mock").with_failure());
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.0, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        let events = collect(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ServerMessage::Error {
                error: ErrorKind::TranscriptionFailed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_timestamps_shift_with_stream_offset() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
            MockRecognizer::new("mock").with_segment(
                Segment::new("late", 0.0, 0.5).with_words(vec![WordInfo {
                    word: "late".to_string(),
                    start: 0.1,
                    end: 0.4,
                    probability: 0.9,
                }]),
            ),
        );
        // Window beginning 5s into the stream, span starting 0.5s into it
        let window = make_window(16_000, 5.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.5, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        let events = collect(rx).await;
        match &events[1] {
            ServerMessage::Final {
                start, end, words, ..
            } => {
                assert!((start - 5.5).abs() < 1e-9);
                assert!((end - 5.9).abs() < 1e-9);
                assert!((words[0].start - 5.6).abs() < 1e-9);
                assert!((words[0].end - 5.9).abs() < 1e-9);
            }
            other => panic!("Expected Final, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_closed_session_discards_results() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
            MockRecognizer::new("mock").with_segment(Segment::new("discarded", 0.0, 1.0)),
        );
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        let inactive = AtomicBool::new(false);
        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(0.0, 1.0),
                DecodeOptions::default(),
                &inactive,
                &tx,
            )
            .await;

        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_span_is_skipped() {
        let pipeline = TranscriptionPipeline::new(2);
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
            MockRecognizer::new("mock").with_segment(Segment::new("never", 0.0, 1.0)),
        );
        let window = make_window(16_000, 0.0);
        let (tx, rx) = mpsc::channel(16);

        pipeline
            .run_span(
                recognizer,
                &window,
                SpeechSpan::new(1.0, 1.0),
                DecodeOptions::default(),
                &active(),
                &tx,
            )
            .await;

        assert!(collect(rx).await.is_empty());
    }

    #[test]
    fn test_slice_span_clamps_to_window() {
        let window = make_window(16_000, 0.0);
        let samples = slice_span(&window, &SpeechSpan::new(0.5, 2.0));
        assert_eq!(samples.len(), 8_000);

        let samples = slice_span(&window, &SpeechSpan::new(0.25, 0.75));
        assert_eq!(samples.len(), 8_000);
    }
}
