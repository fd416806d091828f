//! JSON message protocol spoken over the WebSocket connection.
//!
//! Inbound text frames parse into [`ClientMessage`]; everything the server
//! emits is a [`ServerMessage`]. Binary frames are raw PCM and never appear
//! here.

use crate::defaults;
use crate::error::ScribedError;
use crate::models::catalog::ModelSize;
use serde::{Deserialize, Serialize};

/// Control messages sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Session configuration
    Config {
        #[serde(default)]
        model: ModelSize,
        #[serde(default)]
        language: Option<String>,
        #[serde(default = "default_vad_enabled")]
        vad_enabled: bool,
        #[serde(default = "default_beam_size")]
        beam_size: usize,
    },
    /// Liveness probe; answered with `pong`
    Ping,
}

fn default_vad_enabled() -> bool {
    true
}

fn default_beam_size() -> usize {
    defaults::BEAM_SIZE
}

impl ClientMessage {
    /// Deserialize a client message from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Word with timestamps and recognizer confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub probability: f64,
}

/// Wire error kinds, one per failure category the client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CapacityExceeded,
    SessionNotFound,
    ModelLoadFailed,
    TranscriptionFailed,
    MalformedControlMessage,
    Internal,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Lifecycle notification ("connected", "configured", ...)
    Status {
        status: String,
        session_id: Option<String>,
    },
    /// Interim transcription; `text` is cumulative for the current span
    Partial { text: String, timestamp: f64 },
    /// Conclusive transcription for one speech span
    Final {
        text: String,
        start: f64,
        end: f64,
        language: String,
        words: Vec<WordTimestamp>,
    },
    /// Reported failure; the connection stays open
    Error {
        error: ErrorKind,
        detail: Option<String>,
    },
    /// Answer to a client `ping`
    Pong,
}

impl ServerMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Status message helper.
    pub fn status(status: &str, session_id: Option<String>) -> Self {
        Self::Status {
            status: status.to_string(),
            session_id,
        }
    }

    /// Map an internal error onto its wire representation.
    pub fn from_error(error: &ScribedError) -> Self {
        let (kind, detail) = match error {
            ScribedError::CapacityExceeded { .. } => {
                (ErrorKind::CapacityExceeded, Some(error.to_string()))
            }
            ScribedError::SessionNotFound { .. } => {
                (ErrorKind::SessionNotFound, Some(error.to_string()))
            }
            ScribedError::ModelLoadFailed { .. }
            | ScribedError::UnknownModel { .. }
            | ScribedError::ModelFileNotFound { .. } => {
                (ErrorKind::ModelLoadFailed, Some(error.to_string()))
            }
            ScribedError::Transcription { .. }
            | ScribedError::TranscriptionInferenceFailed { .. } => {
                (ErrorKind::TranscriptionFailed, Some(error.to_string()))
            }
            ScribedError::MalformedControlMessage { .. } => {
                (ErrorKind::MalformedControlMessage, Some(error.to_string()))
            }
            _ => (ErrorKind::Internal, Some(error.to_string())),
        };
        Self::Error {
            error: kind,
            detail,
        }
    }
}
