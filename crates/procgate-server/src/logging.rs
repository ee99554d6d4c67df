//! Logging and tracing setup for the procgate server
//!
//! Console output is always available; JSON files rolled daily can be
//! enabled for production. RUST_LOG takes precedence over the configured
//! default filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_FILTER, ServerConfig};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files should be written
    pub log_dir: PathBuf,

    /// Whether to enable JSON output to files
    pub enable_json_logs: bool,

    /// Whether to enable console output
    pub enable_console_logs: bool,

    /// Pretty multi-line console output instead of compact lines
    pub pretty_console: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close events
    pub enable_spans: bool,

    /// Default log level filter
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: false,
            enable_console_logs: true,
            pretty_console: cfg!(debug_assertions),
            include_location: cfg!(debug_assertions),
            enable_spans: cfg!(debug_assertions),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Compact console output plus JSON files
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            pretty_console: false,
            include_location: false,
            enable_spans: false,
            default_filter: "info,tower_http=warn".to_string(),
        }
    }

    /// Pretty console output, verbose logging
    pub fn development() -> Self {
        Self::default()
    }

    /// Apply the logging options given on the command line
    pub fn from_server_config(config: &ServerConfig) -> Self {
        let mut logging = if cfg!(debug_assertions) {
            Self::development()
        } else {
            Self::production()
        };

        logging.default_filter = config.log_filter.clone();
        if let Some(dir) = &config.log_dir {
            logging.log_dir = dir.clone();
            logging.enable_json_logs = true;
        }
        if config.log_json {
            logging.enable_json_logs = true;
        }
        logging
    }
}

/// Initialize the logging system with the given configuration.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    // RUST_LOG takes precedence over the default filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))?;

    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut guard = None;

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_ansi(true);

        let console_layer = if config.pretty_console {
            console_layer.pretty().with_filter(env_filter.clone()).boxed()
        } else {
            console_layer.compact().with_filter(env_filter.clone()).boxed()
        };
        layers.push(console_layer);
    }

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "procgate.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        console_enabled = config.enable_console_logs,
        "Logging system initialized"
    );

    Ok(guard)
}

/// Default directory for JSON log files
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("procgate")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert!(config.enable_console_logs);
        assert!(!config.enable_json_logs);
        assert_eq!(config.default_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.enable_json_logs);
        assert!(!config.pretty_console);
        assert!(!config.include_location);
    }

    #[test]
    fn test_log_dir_enables_json() {
        let server =
            ServerConfig::try_parse_from(["procgate", "--log-dir", "/var/log/procgate"]).unwrap();
        let config = LoggingConfig::from_server_config(&server);
        assert!(config.enable_json_logs);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/procgate"));
    }

    #[test]
    fn test_log_filter_is_applied() {
        let server =
            ServerConfig::try_parse_from(["procgate", "--log-filter", "warn"]).unwrap();
        let config = LoggingConfig::from_server_config(&server);
        assert_eq!(config.default_filter, "warn");
    }
}
