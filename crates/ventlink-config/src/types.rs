// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `ventlink.toml`. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VentlinkConfig {
    pub network: NetworkConfig,
    pub server: ServerSection,
    pub relay: RelayConfig,
    pub control: ControlConfig,
    pub logging: LoggingConfig,
}

/// Network bring-up
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Name announced when acquiring an address
    pub hostname: String,
    /// Interface the host platform binds listeners on
    pub bind_host: String,
    /// Consecutive address acquisition failures before giving up
    pub max_address_retries: u32,
    /// Link / lease supervision period
    pub link_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hostname: "ventlink".to_string(),
            bind_host: "0.0.0.0".to_string(),
            max_address_retries: 5,
            link_poll_ms: 1000,
        }
    }
}

/// Session multiplexer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub session_count: usize,
    /// Socket number of the first session (0 is reserved for address acquisition)
    pub base_socket_id: u8,
    pub listen_port: u16,
    pub buffer_size: usize,
    pub idle_timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
    /// Sleep between poll cycles, 0 = spin
    pub poll_sleep_us: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            session_count: 5,
            base_socket_id: 1,
            listen_port: 5000,
            buffer_size: 128,
            idle_timeout_secs: 15,
            heartbeat_interval_secs: 5,
            poll_sleep_us: 1000,
        }
    }
}

/// Relay queues between the multiplexer and the controller
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub queue_capacity: usize,
    pub enqueue_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            enqueue_timeout_ms: 10,
        }
    }
}

/// Fan controller
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Speed reported before any `SET` command arrives
    pub initial_speed: u8,
    /// GPIO driving the relay
    pub relay_pin: u8,
    /// Longest wait on the inbound queue before running periodic duties
    pub wait_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            initial_speed: 1,
            relay_pin: 28,
            wait_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` level (error, warn, info, debug, trace)
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_logging: false,
        }
    }
}
