//! Logging infrastructure for vcsclient.
//!
//! The library only emits `tracing` events. Binaries opt into output with
//! [`init_logging`], which supports:
//! - stderr or file output
//! - configurable log levels
//! - text or JSON format

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const LOG_LEVEL_ENV: &str = "VCSCLIENT_LOG_LEVEL";
pub const LOG_FILE_ENV: &str = "VCSCLIENT_LOG_FILE";
pub const LOG_FORMAT_ENV: &str = "VCSCLIENT_LOG_FORMAT";

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a log level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level (None means logging is disabled).
    pub level: Option<LogLevel>,
    /// Output file path (None means stderr).
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Filter directive limiting output to this crate's events.
    #[must_use]
    pub fn filter_directive(&self) -> Option<String> {
        self.level
            .map(|level| format!("vcsclient={}", level.as_filter_str()))
    }
}

/// Guard that must be held to ensure logs are flushed.
///
/// Dropping it flushes all pending log messages.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Returns `None` when logging is disabled or the log file cannot be opened;
/// a failure to set up logging never aborts the program.
///
/// # Example
///
/// ```rust,no_run
/// use vcsclient::logging::{LogConfig, LogLevel, LogFormat, init_logging};
/// use std::path::PathBuf;
///
/// let config = LogConfig {
///     level: Some(LogLevel::Debug),
///     file: Some(PathBuf::from("/tmp/vcsclient.log")),
///     format: LogFormat::Json,
/// };
///
/// let _guard = init_logging(config);
/// ```
#[must_use = "the returned guard must be held until application exit"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let filter = EnvFilter::new(config.filter_directive()?);

    match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_file(true)
                        .with_line_number(true);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .try_init()
                        .ok()?;
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .try_init()
                        .ok()?;
                }
            }
            Some(LogGuard { _guard: guard })
        }
        None => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .try_init()
                        .ok()?;
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .compact();
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .try_init()
                        .ok()?;
                }
            }
            Some(LogGuard { _guard: guard })
        }
    }
}

/// Build the logging configuration from CLI values with environment fallback.
///
/// Unparseable levels disable logging; unparseable formats fall back to text.
#[must_use]
pub fn resolve_log_config(
    cli_level: Option<&str>,
    cli_file: Option<PathBuf>,
    cli_format: Option<&str>,
) -> LogConfig {
    let level = cli_level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_LEVEL_ENV).ok());
    let file = cli_file.or_else(|| {
        std::env::var(LOG_FILE_ENV)
            .ok()
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
    });
    let format = cli_format
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_FORMAT_ENV).ok());

    LogConfig {
        level: level.and_then(|s| LogLevel::parse(&s)),
        file,
        format: format
            .and_then(|s| LogFormat::parse(&s))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::file_serial;
    use std::env;

    /// # Test: Log Level Parsing
    ///
    /// Verifies that log levels are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid log level strings (case-insensitive)
    /// - Parse invalid log level strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogLevel
    /// - Invalid strings return None
    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogLevel::parse(""), None);
    }

    /// # Test: Log Format Parsing
    ///
    /// ## Test Scenario
    /// - Parse valid and invalid format strings
    ///
    /// ## Expected Outcome
    /// - Only text and json are accepted, case-insensitively
    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("yaml"), None);
    }

    /// # Test: Config From CLI Values
    ///
    /// Verifies that CLI values are used as given.
    ///
    /// ## Test Scenario
    /// - Level debug, a log file and json format passed from the CLI
    ///
    /// ## Expected Outcome
    /// - All three values are picked up
    /// - Filter targets only this crate
    #[test]
    #[file_serial(env_tests)]
    fn test_config_from_cli_values() {
        let config = resolve_log_config(
            Some("debug"),
            Some(PathBuf::from("/tmp/test.log")),
            Some("json"),
        );

        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.file, Some(PathBuf::from("/tmp/test.log")));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter_directive().as_deref(), Some("vcsclient=debug"));
    }

    /// # Test: CLI Overrides Environment
    ///
    /// ## Test Scenario
    /// - VCSCLIENT_LOG_LEVEL=warn and VCSCLIENT_LOG_FORMAT=json are set
    /// - Only the level is passed from the CLI
    ///
    /// ## Expected Outcome
    /// - Level comes from the CLI, format from the environment
    #[test]
    #[file_serial(env_tests)]
    fn test_cli_overrides_env() {
        unsafe {
            env::set_var(LOG_LEVEL_ENV, "warn");
            env::set_var(LOG_FORMAT_ENV, "json");
        }

        let config = resolve_log_config(Some("trace"), None, None);

        unsafe {
            env::remove_var(LOG_LEVEL_ENV);
            env::remove_var(LOG_FORMAT_ENV);
        }

        assert_eq!(config.level, Some(LogLevel::Trace));
        assert_eq!(config.format, LogFormat::Json);
    }

    /// # Test: Logging Disabled by Default
    ///
    /// ## Test Scenario
    /// - No CLI values and no environment variables
    ///
    /// ## Expected Outcome
    /// - No level, no filter, and init_logging returns None
    #[test]
    #[file_serial(env_tests)]
    fn test_logging_disabled_by_default() {
        unsafe {
            env::remove_var(LOG_LEVEL_ENV);
            env::remove_var(LOG_FILE_ENV);
            env::remove_var(LOG_FORMAT_ENV);
        }

        let config = resolve_log_config(None, None, None);

        assert!(config.level.is_none());
        assert!(config.filter_directive().is_none());
        assert!(init_logging(config).is_none());
    }
}
