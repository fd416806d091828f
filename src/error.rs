//! Error types for scribed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribedError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Admission control
    #[error("Maximum sessions reached ({max})")]
    CapacityExceeded { max: usize },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    // Model errors
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Model file not found at {path}")]
    ModelFileNotFound { path: String },

    #[error("Failed to load model {model}: {message}")]
    ModelLoadFailed { model: String, message: String },

    // Transcription errors
    #[error("Transcription inference failed: {message}")]
    TranscriptionInferenceFailed { message: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // Protocol errors
    #[error("Malformed control message: {message}")]
    MalformedControlMessage { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_capacity_exceeded_display() {
        let error = ScribedError::CapacityExceeded { max: 10 };
        assert_eq!(error.to_string(), "Maximum sessions reached (10)");
    }

    #[test]
    fn test_session_not_found_display() {
        let error = ScribedError::SessionNotFound {
            id: "abc-123".to_string(),
        };
        assert_eq!(error.to_string(), "Session not found: abc-123");
    }

    #[test]
    fn test_model_load_failed_display() {
        let error = ScribedError::ModelLoadFailed {
            model: "large-v3".to_string(),
            message: "out of memory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load model large-v3: out of memory"
        );
    }

    #[test]
    fn test_unknown_model_display() {
        let error = ScribedError::UnknownModel {
            name: "gigantic".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown model: gigantic");
    }

    #[test]
    fn test_transcription_inference_failed_display() {
        let error = ScribedError::TranscriptionInferenceFailed {
            message: "out of memory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription inference failed: out of memory"
        );
    }

    #[test]
    fn test_malformed_control_message_display() {
        let error = ScribedError::MalformedControlMessage {
            message: "expected value at line 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed control message: expected value at line 1"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = ScribedError::ConfigInvalidValue {
            key: "audio.window_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for audio.window_ms: must be positive"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribedError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: ScribedError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribedError>();
        assert_sync::<ScribedError>();
    }
}
