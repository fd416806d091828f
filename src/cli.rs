//! Command-line interface for scribed
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Real-time streaming speech-to-text server
#[derive(Parser, Debug)]
#[command(
    name = "scribed",
    version,
    about = "Real-time streaming speech-to-text server"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen address override
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Listen port override
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory holding ggml model files
    #[arg(long, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Maximum number of concurrent sessions
    #[arg(long, value_name = "N")]
    pub max_sessions: Option<usize>,

    /// Idle timeout before a session is evicted. Examples: 300, 300s, 5m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout_secs)]
    pub idle_timeout: Option<u64>,

    /// Pre-load a model at startup (e.g. small, large-v3)
    #[arg(long, value_name = "MODEL")]
    pub preload: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.model_dir {
            config.stt.model_dir = dir.clone();
        }
        if let Some(max) = self.max_sessions {
            config.limits.max_sessions = max;
        }
        if let Some(secs) = self.idle_timeout {
            config.limits.session_timeout_secs = secs;
        }
    }
}

/// Parse a timeout duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout_bare_number() {
        assert_eq!(parse_timeout_secs("300").unwrap(), 300);
    }

    #[test]
    fn test_parse_timeout_with_units() {
        assert_eq!(parse_timeout_secs("30s").unwrap(), 30);
        assert_eq!(parse_timeout_secs("5m").unwrap(), 300);
        assert_eq!(parse_timeout_secs("1h30m").unwrap(), 5400);
    }

    #[test]
    fn test_parse_timeout_invalid() {
        assert!(parse_timeout_secs("soon").is_err());
    }

    #[test]
    fn test_apply_to_overrides_only_given_flags() {
        let cli = Cli::parse_from(["scribed", "--port", "9000", "--max-sessions", "2"]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.limits.max_sessions, 2);
        // Untouched fields keep their defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.limits.session_timeout_secs, 300);
    }

    #[test]
    fn test_idle_timeout_flag() {
        let cli = Cli::parse_from(["scribed", "--idle-timeout", "5m"]);
        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.limits.session_timeout_secs, 300);
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
