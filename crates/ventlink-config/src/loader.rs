// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, VentlinkConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "ventlink.toml";

/// Find the ventlink configuration file
///
/// Search order:
/// 1. `VENTLINK_CONFIG_PATH` environment variable
/// 2. Current working directory: `./ventlink.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("VENTLINK_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by VENTLINK_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(
            cwd.ancestors()
                .skip(1)
                .take(5)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet VENTLINK_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Validation is left to [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<VentlinkConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: VentlinkConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, cli_args);
    Ok(config)
}

/// Like [`load_config`] with no explicit path, but falls back to defaults when
/// no file is found anywhere
///
/// Returns the path that was loaded, if any.
pub fn load_config_or_default(
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<(VentlinkConfig, Option<PathBuf>)> {
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args).map(|config| (config, Some(path))),
        Err(ConfigError::FileNotFound(_)) if env::var_os("VENTLINK_CONFIG_PATH").is_none() => {
            let mut config = VentlinkConfig::default();
            apply_overrides(&mut config, cli_args);
            Ok((config, None))
        }
        Err(e) => Err(e),
    }
}

fn apply_overrides(config: &mut VentlinkConfig, cli_args: Option<&HashMap<String, String>>) {
    apply_environment_overrides(config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(config, cli);
    }
}

fn set_parsed<T: FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `VENTLINK_LISTEN_PORT` -> `server.listen_port`
/// - `VENTLINK_SESSION_COUNT` -> `server.session_count`
/// - `VENTLINK_IDLE_TIMEOUT_SECS` -> `server.idle_timeout_secs`
/// - `VENTLINK_HEARTBEAT_INTERVAL_SECS` -> `server.heartbeat_interval_secs`
/// - `VENTLINK_BIND_HOST` -> `network.bind_host`
/// - `VENTLINK_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut VentlinkConfig) {
    if let Ok(value) = env::var("VENTLINK_LISTEN_PORT") {
        set_parsed(&mut config.server.listen_port, &value);
    }
    if let Ok(value) = env::var("VENTLINK_SESSION_COUNT") {
        set_parsed(&mut config.server.session_count, &value);
    }
    if let Ok(value) = env::var("VENTLINK_IDLE_TIMEOUT_SECS") {
        set_parsed(&mut config.server.idle_timeout_secs, &value);
    }
    if let Ok(value) = env::var("VENTLINK_HEARTBEAT_INTERVAL_SECS") {
        set_parsed(&mut config.server.heartbeat_interval_secs, &value);
    }
    if let Ok(value) = env::var("VENTLINK_BIND_HOST") {
        config.network.bind_host = value;
    }
    if let Ok(value) = env::var("VENTLINK_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"listen_port": "6000", "bind_host": "127.0.0.1"}`)
pub fn apply_cli_overrides(config: &mut VentlinkConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("listen_port") {
        set_parsed(&mut config.server.listen_port, value);
    }
    if let Some(value) = cli_args.get("session_count") {
        set_parsed(&mut config.server.session_count, value);
    }
    if let Some(value) = cli_args.get("idle_timeout_secs") {
        set_parsed(&mut config.server.idle_timeout_secs, value);
    }
    if let Some(value) = cli_args.get("heartbeat_interval_secs") {
        set_parsed(&mut config.server.heartbeat_interval_secs, value);
    }
    if let Some(value) = cli_args.get("bind_host") {
        config.network.bind_host = value.clone();
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("relay_pin") {
        set_parsed(&mut config.control.relay_pin, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("VENTLINK_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("VENTLINK_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("VENTLINK_CONFIG_PATH", "/nonexistent/ventlink.toml");
        let result = load_config_or_default(None);
        env::remove_var("VENTLINK_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "session_count = 3").unwrap();
        writeln!(file, "[control]").unwrap();
        writeln!(file, "initial_speed = 2").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.server.session_count, 3);
        assert_eq!(config.control.initial_speed, 2);
        // Untouched sections keep their defaults
        assert_eq!(config.relay.queue_capacity, 10);
        assert_eq!(config.server.heartbeat_interval_secs, 5);
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = VentlinkConfig::default();

        env::set_var("VENTLINK_BIND_HOST", "127.0.0.1");
        env::set_var("VENTLINK_LISTEN_PORT", "6001");
        env::set_var("VENTLINK_SESSION_COUNT", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("VENTLINK_BIND_HOST");
        env::remove_var("VENTLINK_LISTEN_PORT");
        env::remove_var("VENTLINK_SESSION_COUNT");

        assert_eq!(config.network.bind_host, "127.0.0.1");
        assert_eq!(config.server.listen_port, 6001);
        assert_eq!(config.server.session_count, 5);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = VentlinkConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("listen_port".to_string(), "7777".to_string());
        cli_args.insert("session_count".to_string(), "2".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.server.listen_port, 7777);
        assert_eq!(config.server.session_count, 2);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[network]").unwrap();
        writeln!(file, "bind_host = \"10.0.0.5\"").unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "listen_port = 5100").unwrap();

        env::set_var("VENTLINK_BIND_HOST", "env-host");
        env::set_var("VENTLINK_LISTEN_PORT", "5200");

        let mut cli_args = HashMap::new();
        cli_args.insert("bind_host".to_string(), "cli-host".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("VENTLINK_BIND_HOST");
        env::remove_var("VENTLINK_LISTEN_PORT");

        // CLI wins for host, env wins for port (no CLI override)
        assert_eq!(config.network.bind_host, "cli-host");
        assert_eq!(config.server.listen_port, 5200);
    }
}
