//! Configuration types and CLI options.
//!
//! Enums and structs shared between the CLI binary and the library.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::{DB_PATH, DEFAULT_MAX_CONCURRENCY};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// Constructed programmatically or from parsed CLI arguments.
///
/// # Examples
///
/// ```no_run
/// use page_carbon::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("./reports.db"),
///     max_concurrency: 2,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Browser binary used for page instrumentation. When `None`, common
    /// Chromium binaries are probed on PATH.
    pub browser_path: Option<PathBuf>,

    /// Maximum concurrent browser sessions
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            browser_path: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}
