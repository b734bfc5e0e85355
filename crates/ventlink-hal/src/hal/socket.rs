// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Socket Hardware Abstraction Layer
//!
//! This module defines the platform-agnostic trait for the connection-oriented
//! sockets the session multiplexer drives. It mirrors the register-level model of
//! hardwired TCP/IP chips: a fixed set of numbered sockets, each with a status
//! register, a receive-size register and explicit open / listen / disconnect /
//! close commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ SessionPool (ventlink-server)                │
//! └─────────────────┬────────────────────────────┘
//!                   │ uses
//! ┌─────────────────▼────────────────────────────┐
//! │ SocketProvider trait (THIS FILE)             │
//! │ - open_listener() / listen()                 │
//! │ - status() / readable_bytes()                │
//! │ - receive() / send()                         │
//! │ - shutdown() / close()                       │
//! └─────────────────┬────────────────────────────┘
//!                   │ implements
//! ┌─────────────────▼────────────────────────────┐
//! │ Platform Implementation                      │
//! │ - TcpSocketProvider (std::net, host)         │
//! │ - MockSocketProvider (scripted, tests)       │
//! └──────────────────────────────────────────────┘
//! ```

/// Socket number on the network chip (also used as the session routing key)
pub type SocketId = u8;

/// Socket status register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketStatus {
    /// Socket opened, not yet listening
    Init,
    /// Waiting for a peer to connect
    Listen,
    /// Connected to a peer
    Established,
    /// Peer has closed its side; local side must disconnect
    CloseWait,
    /// Socket is closed and must be reopened
    Closed,
    /// Socket is in an unexpected or faulted state
    Error,
}

/// Result of a receive or send
///
/// Keeps the "try again later" case apart from genuine failures instead of
/// overloading a single signed integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer<E> {
    /// `n` bytes were moved
    Complete(usize),
    /// The socket is busy; retry on the next poll
    WouldBlock,
    /// The socket failed; the session must be closed
    Failed(E),
}

impl<E> Transfer<E> {
    /// Number of bytes moved, if the transfer completed
    pub fn completed(&self) -> Option<usize> {
        match self {
            Transfer::Complete(n) => Some(*n),
            _ => None,
        }
    }
}

/// Socket provider trait
///
/// ## Design Principles
///
/// 1. **Non-blocking**: every call returns immediately
/// 2. **Addressed by socket number**: the provider owns the socket table
/// 3. **Status driven**: the caller reads `status()` and issues the matching command
///
/// ## Thread Safety
///
/// Implementations do NOT need to be `Send` or `Sync` - the multiplexer is the
/// only caller and runs on a single thread.
pub trait SocketProvider {
    /// Platform-specific error type
    type Error: core::fmt::Debug;

    /// Open `socket` as a TCP socket bound to `port`
    ///
    /// On success the socket is in [`SocketStatus::Init`].
    fn open_listener(&mut self, socket: SocketId, port: u16) -> Result<(), Self::Error>;

    /// Put an opened socket into passive listen mode
    fn listen(&mut self, socket: SocketId) -> Result<(), Self::Error>;

    /// Read the socket status register
    fn status(&mut self, socket: SocketId) -> SocketStatus;

    /// Number of received bytes waiting to be read
    fn readable_bytes(&mut self, socket: SocketId) -> usize;

    /// Read up to `buffer.len()` bytes
    fn receive(&mut self, socket: SocketId, buffer: &mut [u8]) -> Transfer<Self::Error>;

    /// Queue `data` for transmission
    fn send(&mut self, socket: SocketId, data: &[u8]) -> Transfer<Self::Error>;

    /// Gracefully disconnect from the peer
    fn shutdown(&mut self, socket: SocketId) -> Result<(), Self::Error>;

    /// Close the socket immediately
    fn close(&mut self, socket: SocketId);
}
