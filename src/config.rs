use crate::defaults;
use crate::error::{Result, ScribedError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub limits: LimitsConfig,
}

/// Network listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Audio buffering and voice-activity configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Window duration flushed to the pipeline, in milliseconds.
    pub window_ms: u32,
    /// Hard cap on buffered audio per session, in seconds.
    pub max_buffer_secs: u32,
    pub vad_threshold: f32,
    pub vad_frame_ms: u32,
    pub vad_hangover_ms: u32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    /// Model used by sessions that never send a configuration message.
    pub default_model: String,
    /// Directory holding ggml model files.
    pub model_dir: PathBuf,
    /// Language hint applied when a session does not specify one.
    pub language: Option<String>,
    pub beam_size: usize,
}

/// Session and worker-pool limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_sessions: usize,
    pub session_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_concurrent_transcriptions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            window_ms: defaults::WINDOW_MS,
            max_buffer_secs: defaults::MAX_BUFFER_SECS,
            vad_threshold: defaults::VAD_THRESHOLD,
            vad_frame_ms: defaults::VAD_FRAME_MS,
            vad_hangover_ms: defaults::VAD_HANGOVER_MS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            default_model: defaults::DEFAULT_MODEL.to_string(),
            model_dir: default_model_dir(),
            language: None,
            beam_size: defaults::BEAM_SIZE,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: defaults::MAX_SESSIONS,
            session_timeout_secs: defaults::SESSION_TIMEOUT_SECS,
            sweep_interval_secs: defaults::SWEEP_INTERVAL_SECS,
            max_concurrent_transcriptions: defaults::MAX_CONCURRENT_TRANSCRIPTIONS,
        }
    }
}

/// Default directory for ggml model files.
///
/// Returns ~/.cache/scribed/models on Linux, falling back to ./models when
/// no cache directory can be determined.
pub fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("scribed").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

impl AudioConfig {
    /// Bytes of audio per second at the configured sample rate.
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate * defaults::BYTES_PER_SAMPLE
    }

    /// Flush threshold in bytes.
    pub fn window_bytes(&self) -> usize {
        (self.bytes_per_second() as u64 * self.window_ms as u64 / 1000) as usize
    }

    /// Hard buffer cap in bytes.
    pub fn max_buffer_bytes(&self) -> usize {
        (self.bytes_per_second() as u64 * self.max_buffer_secs as u64) as usize
    }
}

impl LimitsConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ScribedError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SCRIBED_MODEL → stt.default_model
    /// - SCRIBED_MODEL_DIR → stt.model_dir
    /// - SCRIBED_HOST → server.host
    /// - SCRIBED_PORT → server.port
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SCRIBED_MODEL")
            && !model.is_empty()
        {
            self.stt.default_model = model;
        }

        if let Ok(dir) = std::env::var("SCRIBED_MODEL_DIR")
            && !dir.is_empty()
        {
            self.stt.model_dir = PathBuf::from(dir);
        }

        if let Ok(host) = std::env::var("SCRIBED_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SCRIBED_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }

        self
    }

    /// Validate cross-field constraints.
    ///
    /// The window must be nonzero and must fit inside the buffer cap, and
    /// the concurrency limits must be nonzero.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(ScribedError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.window_ms == 0 {
            return Err(ScribedError::ConfigInvalidValue {
                key: "audio.window_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.window_bytes() > self.audio.max_buffer_bytes() {
            return Err(ScribedError::ConfigInvalidValue {
                key: "audio.window_ms".to_string(),
                message: format!(
                    "window ({}ms) exceeds the buffer cap ({}s)",
                    self.audio.window_ms, self.audio.max_buffer_secs
                ),
            });
        }
        if self.limits.max_sessions == 0 {
            return Err(ScribedError::ConfigInvalidValue {
                key: "limits.max_sessions".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.limits.max_concurrent_transcriptions == 0 {
            return Err(ScribedError::ConfigInvalidValue {
                key: "limits.max_concurrent_transcriptions".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/scribed/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("scribed").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
