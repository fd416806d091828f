//! Per-connection session state and the session registry.

pub mod manager;

use crate::audio::AudioBuffer;
use crate::defaults;
use crate::models::catalog::ModelSize;
use crate::protocol::ServerMessage;
use crate::stt::recognizer::DecodeOptions;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created on handshake; no configuration received yet.
    Connected,
    /// At least one configuration message applied.
    Configured,
    /// First transcription invocation has started.
    Streaming,
    /// Disconnect or eviction in progress; no new audio accepted.
    Closing,
    /// Terminal; the registry entry is gone.
    Closed,
}

/// Decoding configuration of one session.
///
/// Sessions that stream audio before configuring run with the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model: ModelSize,
    pub language: Option<String>,
    pub vad_enabled: bool,
    pub beam_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: ModelSize::default(),
            language: None,
            vad_enabled: true,
            beam_size: defaults::BEAM_SIZE,
        }
    }
}

impl SessionConfig {
    /// Options handed to the recognizer for this session.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            language: self.language.clone(),
            beam_size: self.beam_size,
        }
    }
}

/// Server-side state for one streaming connection.
///
/// Owned by the registry; mutated only under its own lock by the connection
/// task and the idle sweep.
pub struct Session {
    /// Opaque unique identifier, immutable after creation.
    pub id: String,
    pub config: SessionConfig,
    pub state: SessionState,
    /// Unconsumed audio; grows via append, drains on each flush.
    pub buffer: AudioBuffer,
    pub created_at: Instant,
    /// Updated on every inbound frame or control message.
    pub last_activity: Instant,
    /// Outbound result events toward the connection task.
    pub events: mpsc::Sender<ServerMessage>,
    /// Cleared on close; in-flight results check it before delivery.
    pub is_active: Arc<AtomicBool>,
}

impl Session {
    /// Creates a session in the Connected state.
    pub fn new(
        id: String,
        config: SessionConfig,
        buffer: AudioBuffer,
        events: mpsc::Sender<ServerMessage>,
        now: Instant,
    ) -> Self {
        Self {
            id,
            config,
            state: SessionState::Connected,
            buffer,
            created_at: now,
            last_activity: now,
            events,
            is_active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Update last activity timestamp.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// How long the session has been idle.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.duration_since(self.last_activity)
    }

    /// Records that a configuration message was applied.
    ///
    /// Reconfiguring while Streaming does not reset the state.
    pub fn mark_configured(&mut self) {
        if self.state == SessionState::Connected {
            self.state = SessionState::Configured;
        }
    }

    /// Records that a transcription invocation is starting.
    pub fn begin_streaming(&mut self) {
        if matches!(self.state, SessionState::Connected | SessionState::Configured) {
            self.state = SessionState::Streaming;
        }
    }

    /// Enters the Closing state and stops result delivery.
    pub fn begin_close(&mut self) {
        self.state = SessionState::Closing;
        self.is_active.store(false, Ordering::SeqCst);
    }

    /// Enters the terminal Closed state.
    pub fn finish_close(&mut self) {
        self.state = SessionState::Closed;
    }
}
