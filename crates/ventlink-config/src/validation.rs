// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module provides validation logic to ensure configuration values are
//! consistent, within valid ranges, and fit the hardware.

use crate::{ConfigError, ConfigResult, VentlinkConfig};

/// Sockets available on the network chip; socket 0 belongs to address acquisition
pub const HARDWARE_SOCKETS: usize = 8;

/// Longest command frame on the wire (`SET3#`)
pub const MIN_BUFFER_SIZE: usize = 5;

/// Largest receive buffer the multiplexer allocates
pub const MAX_BUFFER_SIZE: usize = 128;

/// Highest fan speed
pub const MAX_SPEED: u8 = 3;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &VentlinkConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_sessions(config, &mut errors);
    validate_timing(config, &mut errors);
    validate_required_fields(config, &mut errors);
    validate_control(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_sessions(config: &VentlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let server = &config.server;

    if server.session_count == 0 {
        errors.push(invalid("server.session_count", "must be at least 1"));
    }
    if server.base_socket_id == 0 {
        errors.push(invalid(
            "server.base_socket_id",
            "socket 0 is reserved for address acquisition",
        ));
    }
    let last_socket = usize::from(server.base_socket_id) + server.session_count;
    if server.session_count > 0 && last_socket > HARDWARE_SOCKETS {
        errors.push(invalid(
            "server.session_count",
            format!(
                "sockets {}..{} exceed the {} hardware sockets",
                server.base_socket_id, last_socket, HARDWARE_SOCKETS
            ),
        ));
    }
    if server.listen_port == 0 {
        errors.push(invalid("server.listen_port", "must not be 0"));
    }
    if server.buffer_size < MIN_BUFFER_SIZE || server.buffer_size > MAX_BUFFER_SIZE {
        errors.push(invalid(
            "server.buffer_size",
            format!("must be between {} and {}", MIN_BUFFER_SIZE, MAX_BUFFER_SIZE),
        ));
    }
    if config.relay.queue_capacity == 0 {
        errors.push(invalid("relay.queue_capacity", "must be at least 1"));
    }
}

fn validate_timing(config: &VentlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let server = &config.server;

    if server.idle_timeout_secs == 0 {
        errors.push(invalid("server.idle_timeout_secs", "must be positive"));
    }
    if server.heartbeat_interval_secs >= server.idle_timeout_secs {
        errors.push(invalid(
            "server.heartbeat_interval_secs",
            "must be shorter than server.idle_timeout_secs",
        ));
    }
    if config.network.link_poll_ms == 0 {
        errors.push(invalid("network.link_poll_ms", "must be positive"));
    }
}

fn validate_required_fields(config: &VentlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.network.bind_host.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "network.bind_host".to_string(),
        });
    }
    if config.network.hostname.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "network.hostname".to_string(),
        });
    }
}

fn validate_control(config: &VentlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.control.initial_speed > MAX_SPEED {
        errors.push(invalid(
            "control.initial_speed",
            format!("must be between 0 and {}", MAX_SPEED),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(config: &VentlinkConfig) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = VentlinkConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_sessions() {
        let mut config = VentlinkConfig::default();
        config.server.session_count = 0;
        assert!(message(&config).contains("server.session_count"));
    }

    #[test]
    fn test_too_many_sessions() {
        let mut config = VentlinkConfig::default();
        config.server.session_count = 7;
        assert!(validate_config(&config).is_ok());

        config.server.session_count = 8;
        assert!(message(&config).contains("hardware sockets"));
    }

    #[test]
    fn test_reserved_socket() {
        let mut config = VentlinkConfig::default();
        config.server.base_socket_id = 0;
        assert!(message(&config).contains("server.base_socket_id"));
    }

    #[test]
    fn test_buffer_must_hold_longest_frame() {
        let mut config = VentlinkConfig::default();
        config.server.buffer_size = 4;
        assert!(message(&config).contains("server.buffer_size"));
    }

    #[test]
    fn test_heartbeat_must_be_shorter_than_timeout() {
        let mut config = VentlinkConfig::default();
        config.server.heartbeat_interval_secs = 15;
        assert!(message(&config).contains("heartbeat_interval_secs"));
    }

    #[test]
    fn test_multiple_errors_are_listed() {
        let mut config = VentlinkConfig::default();
        config.server.listen_port = 0;
        config.relay.queue_capacity = 0;
        config.control.initial_speed = 4;

        let msg = message(&config);
        assert!(msg.contains("server.listen_port"));
        assert!(msg.contains("relay.queue_capacity"));
        assert!(msg.contains("control.initial_speed"));
    }

    #[test]
    fn test_missing_bind_host() {
        let mut config = VentlinkConfig::default();
        config.network.bind_host = String::new();
        assert!(message(&config).contains("network.bind_host"));
    }
}
