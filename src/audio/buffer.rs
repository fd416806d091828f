//! Per-session audio accumulation.
//!
//! Inbound PCM bytes are appended until a full processing window is
//! buffered, then handed off in one piece and the buffer reset. Window
//! offsets are tracked against the session stream start so timestamps stay
//! monotonic across flushes.

use crate::audio::pcm;

/// A contiguous block of buffered audio handed to the pipeline.
///
/// `start`/`end` are seconds relative to the first byte the session ever
/// received.
#[derive(Debug, Clone)]
pub struct AudioWindow {
    pub samples: Vec<i16>,
    pub start: f64,
    pub end: f64,
    pub sample_rate: u32,
}

impl AudioWindow {
    /// Returns true if the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window length in seconds.
    pub fn duration_secs(&self) -> f64 {
        pcm::duration_secs(self.samples.len(), self.sample_rate)
    }
}

/// Accumulates raw PCM bytes until a processing window is ready.
#[derive(Debug)]
pub struct AudioBuffer {
    data: Vec<u8>,
    threshold_bytes: usize,
    max_bytes: usize,
    sample_rate: u32,
    /// Total bytes already handed off in previous flushes.
    consumed_bytes: u64,
}

impl AudioBuffer {
    /// Creates a buffer that signals readiness at `threshold_bytes` and must
    /// never be allowed to grow past `max_bytes`.
    pub fn new(threshold_bytes: usize, max_bytes: usize, sample_rate: u32) -> Self {
        Self {
            data: Vec::with_capacity(threshold_bytes),
            threshold_bytes,
            max_bytes,
            sample_rate,
            consumed_bytes: 0,
        }
    }

    /// Appends raw bytes to the tail of the buffer.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Number of buffered, not-yet-flushed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no audio is buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True once a full processing window is buffered.
    pub fn ready_to_flush(&self) -> bool {
        self.data.len() >= self.threshold_bytes
    }

    /// True when the hard cap is reached; callers must flush immediately.
    pub fn at_capacity(&self) -> bool {
        self.data.len() >= self.max_bytes
    }

    /// Seconds of audio consumed by previous flushes.
    pub fn stream_position_secs(&self) -> f64 {
        self.consumed_bytes as f64 / self.bytes_per_second()
    }

    /// Returns the entire buffered window and clears the buffer.
    ///
    /// A trailing odd byte (half a PCM16 sample) is carried over to the next
    /// window instead of being dropped. Flushing an empty buffer returns an
    /// empty window.
    pub fn flush(&mut self) -> AudioWindow {
        let aligned = self.data.len() - self.data.len() % 2;
        let carry = self.data.split_off(aligned);
        let samples = pcm::bytes_to_samples(&self.data);
        self.data = carry;

        let start = self.consumed_bytes as f64 / self.bytes_per_second();
        self.consumed_bytes += aligned as u64;
        let end = self.consumed_bytes as f64 / self.bytes_per_second();

        AudioWindow {
            samples,
            start,
            end,
            sample_rate: self.sample_rate,
        }
    }

    fn bytes_per_second(&self) -> f64 {
        (self.sample_rate * 2) as f64
    }
}
