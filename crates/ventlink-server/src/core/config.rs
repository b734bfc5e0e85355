// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Server configuration

use std::time::Duration;

use ventlink_config::VentlinkConfig;

use super::types::{Result, ServerError, SessionId};
use crate::session::BUFFER_SIZE;

/// Number of sockets on the network chip; socket 0 belongs to the address client
pub const HARDWARE_SOCKET_COUNT: usize = 8;

/// Longest command frame the parser recognizes (`SET3#`)
pub const LONGEST_COMMAND_FRAME: usize = 5;

/// Configuration for the session pool and its threads
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number of pool slots (fixed for the process lifetime)
    pub session_count: usize,
    /// Socket number of the first slot; slot `i` uses `base_socket_id + i`
    pub base_socket_id: SessionId,
    /// Port every slot listens on
    pub listen_port: u16,
    /// Receive / send buffer size per session
    pub buffer_size: usize,
    /// Close a session when nothing was received for this long
    pub idle_timeout: Duration,
    /// Send `HB#` when nothing was sent for this long
    pub heartbeat_interval: Duration,
    /// Relay queue capacity (both directions)
    pub queue_capacity: usize,
    /// How long a relay push may wait before the item is dropped
    pub enqueue_timeout: Duration,
    /// Pause between poll cycles (0 = spin)
    pub poll_sleep: Duration,
    /// Poll interval while the network is down
    pub link_poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session_count: 5,
            base_socket_id: 1,
            listen_port: 5000,
            buffer_size: BUFFER_SIZE,
            idle_timeout: Duration::from_secs(15),
            heartbeat_interval: Duration::from_secs(5),
            queue_capacity: 10,
            enqueue_timeout: Duration::from_millis(10),
            poll_sleep: Duration::from_millis(1),
            link_poll_interval: Duration::from_secs(1),
        }
    }
}

impl ServerConfig {
    /// Build from the loaded configuration file
    pub fn from_config(config: &VentlinkConfig) -> Self {
        Self {
            session_count: config.server.session_count,
            base_socket_id: config.server.base_socket_id,
            listen_port: config.server.listen_port,
            buffer_size: config.server.buffer_size,
            idle_timeout: Duration::from_secs(config.server.idle_timeout_secs),
            heartbeat_interval: Duration::from_secs(config.server.heartbeat_interval_secs),
            queue_capacity: config.relay.queue_capacity,
            enqueue_timeout: Duration::from_millis(config.relay.enqueue_timeout_ms),
            poll_sleep: Duration::from_micros(config.server.poll_sleep_us),
            link_poll_interval: Duration::from_millis(config.network.link_poll_ms),
        }
    }

    /// Socket numbers of every slot, in round-robin order
    pub fn session_ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        (0..self.session_count).map(move |i| self.base_socket_id + i as SessionId)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_count == 0 {
            return Err(ServerError::Config("session_count must be at least 1".into()));
        }
        if self.base_socket_id == 0 {
            return Err(ServerError::Config(
                "base_socket_id 0 is reserved for the address client".into(),
            ));
        }
        if usize::from(self.base_socket_id) + self.session_count > HARDWARE_SOCKET_COUNT {
            return Err(ServerError::Config(format!(
                "sockets {}..{} exceed the {} hardware sockets",
                self.base_socket_id,
                usize::from(self.base_socket_id) + self.session_count,
                HARDWARE_SOCKET_COUNT
            )));
        }
        if self.buffer_size < LONGEST_COMMAND_FRAME || self.buffer_size > BUFFER_SIZE {
            return Err(ServerError::Config(format!(
                "buffer_size {} must be within {}..={}",
                self.buffer_size, LONGEST_COMMAND_FRAME, BUFFER_SIZE
            )));
        }
        if self.heartbeat_interval >= self.idle_timeout {
            return Err(ServerError::Config(format!(
                "heartbeat_interval {:?} must be shorter than idle_timeout {:?}",
                self.heartbeat_interval, self.idle_timeout
            )));
        }
        if self.queue_capacity == 0 {
            return Err(ServerError::Config("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.session_ids().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rejects_too_many_sessions() {
        let config = ServerConfig {
            session_count: 7,
            base_socket_id: 2,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_heartbeat_not_shorter_than_timeout() {
        let config = ServerConfig {
            heartbeat_interval: Duration::from_secs(15),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_config() {
        let mut file_config = VentlinkConfig::default();
        file_config.server.listen_port = 7000;
        file_config.server.idle_timeout_secs = 30;
        file_config.relay.enqueue_timeout_ms = 25;

        let config = ServerConfig::from_config(&file_config);
        assert_eq!(config.listen_port, 7000);
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.enqueue_timeout, Duration::from_millis(25));
    }
}
