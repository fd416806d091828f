//! Default configuration constants for scribed.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Bytes per sample on the wire (16-bit signed PCM).
pub const BYTES_PER_SAMPLE: u32 = 2;

/// Default processing window duration in milliseconds.
///
/// A session's buffer is flushed to the transcription pipeline once it holds
/// this much audio: 1000ms at 16kHz/16-bit mono is 32,000 bytes.
pub const WINDOW_MS: u32 = 1000;

/// Hard cap on buffered audio per session, in seconds.
///
/// A session's buffer must be flushed before it exceeds this bound; the
/// configured window duration may never be larger than the cap.
pub const MAX_BUFFER_SECS: u32 = 10;

/// Default Voice Activity Detection (VAD) threshold.
///
/// This RMS-based threshold (0.0 to 1.0) determines when audio is considered
/// speech. A value of 0.02 is tuned for typical microphone input levels and
/// provides good sensitivity while filtering out background noise.
pub const VAD_THRESHOLD: f32 = 0.02;

/// VAD analysis frame length in milliseconds.
///
/// Each buffered window is scanned in frames of this length; contiguous
/// frames above the threshold become speech spans.
pub const VAD_FRAME_MS: u32 = 30;

/// Maximum silent gap in milliseconds bridged inside one speech span.
///
/// Short pauses between words should not split a span into two inference
/// calls.
pub const VAD_HANGOVER_MS: u32 = 300;

/// Default Whisper model for new sessions.
///
/// Sessions that stream audio before sending a configuration message are
/// processed with this model.
pub const DEFAULT_MODEL: &str = "small";

/// Default beam size for decoding.
pub const BEAM_SIZE: usize = 5;

/// Maximum number of concurrently active sessions.
///
/// Admission control: connection attempts beyond this are refused, never
/// queued.
pub const MAX_SESSIONS: usize = 10;

/// Idle timeout in seconds before a session is evicted by the sweep.
pub const SESSION_TIMEOUT_SECS: u64 = 300;

/// Interval in seconds between idle-sweep passes.
pub const SWEEP_INTERVAL_SECS: u64 = 30;

/// Maximum number of concurrent inference calls across all sessions.
///
/// A second backpressure layer independent of `MAX_SESSIONS`: when the pool
/// is saturated, further invocations wait for a permit instead of spawning
/// unbounded blocking work.
pub const MAX_CONCURRENT_TRANSCRIPTIONS: usize = 2;

/// Default listen address.
pub const HOST: &str = "0.0.0.0";

/// Default listen port.
pub const PORT: u16 = 8002;

/// Bytes of audio per second at the wire format (16kHz, 16-bit, mono).
pub const fn bytes_per_second() -> u32 {
    SAMPLE_RATE * BYTES_PER_SAMPLE
}

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns
/// "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else {
        "CPU"
    }
}
