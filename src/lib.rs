//! scribed - real-time streaming speech-to-text server.
//!
//! Ingests live PCM audio over a persistent WebSocket connection and streams
//! partial and final transcription results back with low latency.

// Enforce error handling discipline in non-test code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod session;
pub mod stt;
pub mod vad;

// Capability boundaries (swap real backends for mocks in tests)
pub use stt::recognizer::SpeechRecognizer;
pub use vad::detector::VoiceActivityDetector;

// Session management
pub use session::manager::SessionManager;
pub use session::{SessionConfig, SessionState};

// Error handling
pub use error::{Result, ScribedError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
