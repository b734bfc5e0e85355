//! Logging configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log format of the file output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for crates without a debug flag (trace, debug, info, warn, error)
    pub level: String,

    /// Base directory for run folders (file logging only)
    pub log_dir: PathBuf,

    /// Also write log files (needs the `file-logging` feature)
    pub file_logging: bool,

    /// Format of the log files
    pub file_format: LogFormat,

    /// Keep this many most recent run folders
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            file_format: LogFormat::Json,
            retention_runs: 10,
        }
    }
}
