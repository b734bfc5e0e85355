//! # ventlink - multi-client fan control endpoint
//!
//! ventlink accepts several concurrent TCP clients on one port, frames their
//! `#`-terminated commands (`GET#`, `SET<n>#`, `HB#`) and relays them to a
//! single fan controller, routing each reply back to the client that asked.
//!
//! ## Feature Flags
//!
//! - **`control`** (default): the fan controller consuming the relay queues
//! - **`mock`**: scripted sockets, link and clock for deterministic tests
//! - **`file-logging`**: daily-rolling log files next to console output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ventlink::prelude::*;
//!
//! let config = ServerConfig::default();
//! let (server, consumer) = relay_channels(config.queue_capacity, config.enqueue_timeout);
//! let shutdown = Arc::new(AtomicBool::new(false));
//!
//! let control = VentControl::new(1, NoopActuator)?;
//! let _worker = ControlWorker::spawn(control, consumer, Duration::from_secs(1), shutdown.clone())?;
//!
//! let pool = SessionPool::new(config, TcpSocketProvider::new("0.0.0.0"), HostClock::new(), server)?;
//! let gate = StartupGate::new();
//! let network = NetworkStatus::new();
//! let _runtime = ServerRuntime::spawn(pool, gate.clone(), network.clone(), shutdown)?;
//!
//! network.set_up(true);
//! gate.release();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: ventlink-hal, ventlink-config              │
//! │  (sockets, clock, GPIO, link; TOML + overrides)         │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Server: ventlink-server                                 │
//! │  (session pool, frame parser, relay queues, gate)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Consumer: ventlink-control                             │
//! │  (fan speed state, relay actuator)                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use ventlink_config as config;
pub use ventlink_hal as hal;
pub use ventlink_observability as observability;

// Re-export server
pub use ventlink_server as server;

// Re-export consumer
#[cfg(feature = "control")]
pub use ventlink_control as control;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::hal::platforms::{HostClock, HostGpio, HostLink, StaticAddress, TcpSocketProvider};
    pub use crate::hal::{SocketProvider, TimeProvider};

    pub use crate::server::{
        relay_channels, ConsumerEndpoint, Message, MessageType, NetworkStatus, NetworkSupervisor,
        ServerConfig, ServerEndpoint, ServerRuntime, SessionPool, StartupGate,
    };

    pub use crate::config::{load_config_or_default, validate_config, VentlinkConfig};

    #[cfg(feature = "control")]
    pub use crate::control::{ControlWorker, NoopActuator, RelayActuator, VentControl};
}
