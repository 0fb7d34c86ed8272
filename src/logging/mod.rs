//! Logging setup for the node binaries.
//!
//! Wraps `tracing-subscriber` with the text/json/compact formats and optional
//! daily-rolling file output. Initialization is once-only so library users and
//! the binaries cannot double-install a subscriber. `RUST_LOG` always wins
//! over the config-derived level.

pub mod format;

use std::io;
use std::path::PathBuf;
use std::sync::{Once, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use format::{CompactFormatter, TextFormatter};

static INIT: Once = Once::new();

/// Keeps the non-blocking file writer alive for the lifetime of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `YYYY-MM-DD HH:MM:SS | LEVEL | target | message`
    #[default]
    Text,
    /// NDJSON for log aggregation
    Json,
    /// `[LEVEL] message`
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!(
                "Invalid log format '{}'. Valid options: text, json, compact",
                s
            )),
        }
    }
}

/// Logging configuration shared by the miner, validator and CLI.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Enable debug-level logging
    pub debug: bool,
    /// Enable trace-level logging (overrides debug)
    pub trace: bool,
    /// Also write logs to a daily-rolling file
    pub record_log: bool,
    /// Directory for log files (`~` expands to the home directory)
    pub logging_dir: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            trace: false,
            record_log: false,
            logging_dir: "~/.bittensor/logs".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_file_logging(mut self, enabled: bool) -> Self {
        self.record_log = enabled;
        self
    }

    pub fn with_logging_dir(mut self, dir: impl Into<String>) -> Self {
        self.logging_dir = dir.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn get_level(&self) -> Level {
        if self.trace {
            Level::TRACE
        } else if self.debug {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    fn expand_path(&self) -> PathBuf {
        if let Some(stripped) = self.logging_dir.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(&self.logging_dir)
    }
}

/// Initialize the logging system. Only the first call takes effect.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| init_logging_internal(config));
}

fn init_logging_internal(config: &LoggingConfig) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = config.get_level();
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn,h2=warn", level))
    };

    let file_appender = if config.record_log {
        let log_dir = config.expand_path();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: failed to create log directory {:?}: {}",
                log_dir, e
            );
            None
        } else {
            let appender = tracing_appender::rolling::daily(&log_dir, "node.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(non_blocking)
        }
    } else {
        None
    };

    match config.format {
        LogFormat::Text => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .event_format(TextFormatter)
                            .with_writer(io::stdout),
                    )
                    .with(
                        fmt::layer()
                            .event_format(TextFormatter)
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .event_format(TextFormatter)
                            .with_writer(io::stdout),
                    )
                    .init();
            }
        }
        LogFormat::Json => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(io::stdout))
                    .with(
                        fmt::layer()
                            .json()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(io::stdout))
                    .init();
            }
        }
        LogFormat::Compact => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .event_format(CompactFormatter)
                            .with_writer(io::stdout),
                    )
                    .with(
                        fmt::layer()
                            .event_format(CompactFormatter)
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .event_format(CompactFormatter)
                            .with_writer(io::stdout),
                    )
                    .init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert!(!config.debug);
        assert!(!config.record_log);
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn test_level_precedence() {
        let config = LoggingConfig::new().with_debug(true);
        assert_eq!(config.get_level(), Level::DEBUG);

        // trace beats debug
        let config = LoggingConfig::new().with_debug(true).with_trace(true);
        assert_eq!(config.get_level(), Level::TRACE);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("nope".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_expand_path() {
        let config = LoggingConfig::new().with_logging_dir("/var/log/subnet");
        assert_eq!(config.expand_path().to_string_lossy(), "/var/log/subnet");

        let config = LoggingConfig::default();
        assert!(!config.expand_path().to_string_lossy().starts_with('~'));
    }
}
