// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for ventlink
//!
//! Always installs a console layer. With the `file-logging` feature and
//! `file_logging = true` it also writes a daily-rolling log file:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── ventlink.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::LoggingConfig;

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder of this process, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Build the filter for the console (and file) layers
pub fn build_filter(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))
}

/// Initialize logging
///
/// # Errors
/// Fails when the filter is invalid, the log directory cannot be created, or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let env_filter = build_filter(config, debug_flags)?;

    let mut layers = Vec::new();

    // Console layer (human-readable)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = if config.file_logging {
        let (layer, guard, run_folder) = file_layer(config, debug_flags)?;
        layers.push(layer);
        (vec![guard], Some(run_folder))
    } else {
        (Vec::new(), None)
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir = {
        if config.file_logging {
            eprintln!("Warning: file logging requested but the file-logging feature is disabled");
        }
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

#[cfg(feature = "file-logging")]
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[cfg(feature = "file-logging")]
fn file_layer(
    config: &LoggingConfig,
    debug_flags: &CrateDebugFlags,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard, PathBuf)> {
    use crate::config::LogFormat;
    use tracing_appender::rolling;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = config.log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_runs(&config.log_dir, config.retention_runs)?;

    let appender = rolling::daily(&run_folder, "ventlink.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = build_filter(config, debug_flags)?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);
    let layer = match config.file_format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Text => layer.with_filter(filter).boxed(),
    };

    Ok((layer, guard, run_folder))
}

/// Keep only the `retention_runs` most recent `run_*` folders
#[cfg(feature = "file-logging")]
pub fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<()> {
    use chrono::NaiveDateTime;

    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(stamp) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
        else {
            continue;
        };
        if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S") {
            runs.push((path, dt));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let excess = runs.len().saturating_sub(retention_runs);
    for (path, _) in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }

    Ok(())
}
