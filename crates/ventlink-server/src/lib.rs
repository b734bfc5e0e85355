// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ventlink session multiplexer
//!
//! Accepts several concurrent client connections, frames their `#`-terminated
//! commands and relays them to the control consumer, routing the replies back
//! to the originating session.
//!
//! # Architecture
//!
//! - **`core/`**: shared types (`Message`, `MessageType`), configuration, errors
//! - **`session`**: per-slot buffers and liveness timestamps
//! - **`state_machine`**: one poll step per session, driven by the socket status register
//! - **`frame`**: wire protocol parser and reply encoder
//! - **`pool`**: the multiplexer owning every session
//! - **`relay`**: the two bounded queues to and from the consumer
//! - **`gate`** / **`supervisor`**: startup gate and network supervision
//! - **`runtime`**: runs the pool on its own thread
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//! use ventlink_hal::platforms::{HostClock, TcpSocketProvider};
//! use ventlink_server::{relay_channels, NetworkStatus, ServerConfig, ServerRuntime, SessionPool, StartupGate};
//!
//! let config = ServerConfig::default();
//! let (server, _consumer) = relay_channels(config.queue_capacity, config.enqueue_timeout);
//! let pool = SessionPool::new(config, TcpSocketProvider::new("0.0.0.0"), HostClock::new(), server).unwrap();
//!
//! let gate = StartupGate::new();
//! let network = NetworkStatus::new();
//! let runtime = ServerRuntime::spawn(pool, gate.clone(), network.clone(), Arc::new(AtomicBool::new(false))).unwrap();
//!
//! network.set_up(true);
//! gate.release();
//! # drop(runtime);
//! ```

pub mod core;
pub mod frame;
pub mod gate;
pub mod pool;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod state_machine;
pub mod supervisor;

pub use core::{Message, MessageType, Result, ServerConfig, ServerError, SessionId};
pub use frame::{encode_reply, extract_frame, Command, FrameResult, HEARTBEAT_FRAME, TERMINATOR};
pub use gate::StartupGate;
pub use pool::{PoolStats, SessionPool, SessionSnapshot, MAX_SESSIONS};
pub use relay::{
    relay_channels, ChannelStats, ConsumerEndpoint, RelayError, RelayReceiver, RelaySender,
    ServerEndpoint,
};
pub use runtime::ServerRuntime;
pub use session::{Session, SessionState, BUFFER_SIZE};
pub use state_machine::{step, CloseReason, StepPolicy, StepReport};
pub use supervisor::{NetworkStatus, NetworkSupervisor, SupervisorState};
