// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scripted platform for deterministic tests
//!
//! [`MockSocketProvider`] plays the role of both the network chip and the remote
//! peers: tests connect peers, inject inbound bytes, force failures and inspect
//! every frame the endpoint sent. [`MockClock`] only moves when told to.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::hal::{
    AddressProvider, LeaseStatus, LinkProvider, SocketId, SocketProvider, SocketStatus,
    TimeProvider, Transfer,
};

/// Manually advanced clock
///
/// Clones share the same time source, so a test can keep one handle while the
/// code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_us: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        self.now_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute timestamp
    pub fn set_us(&self, now_us: u64) {
        self.now_us.store(now_us, Ordering::SeqCst);
    }
}

impl TimeProvider for MockClock {
    fn get_time_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn delay_us(&self, us: u32) {
        self.now_us.fetch_add(u64::from(us), Ordering::SeqCst);
    }
}

/// Failure injected by a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSocketError {
    /// Socket number was never opened
    NotOpen(SocketId),
    /// Failure scripted by the test
    Injected,
}

/// State of one scripted socket
#[derive(Debug, Default)]
struct MockSocket {
    port: u16,
    status: Option<SocketStatus>,
    inbound: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
    fail_next_receive: bool,
    fail_next_send: bool,
    blocked_sends: usize,
    failing_opens: usize,
    failing_listens: usize,
    failing_shutdowns: usize,
    open_calls: usize,
    listen_calls: usize,
    shutdown_calls: usize,
    close_calls: usize,
}

/// Scripted socket table
#[derive(Debug, Default)]
pub struct MockSocketProvider {
    sockets: HashMap<SocketId, MockSocket>,
}

impl MockSocketProvider {
    /// Create an empty socket table
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self, socket: SocketId) -> &mut MockSocket {
        self.sockets.entry(socket).or_default()
    }

    /// A peer connects to a listening socket
    ///
    /// Returns `false` when the socket is not listening.
    pub fn connect_peer(&mut self, socket: SocketId) -> bool {
        let entry = self.socket(socket);
        if entry.status == Some(SocketStatus::Listen) {
            entry.status = Some(SocketStatus::Established);
            entry.inbound.clear();
            true
        } else {
            false
        }
    }

    /// The peer writes `bytes`
    pub fn push_inbound(&mut self, socket: SocketId, bytes: &[u8]) {
        self.socket(socket).inbound.extend(bytes.iter().copied());
    }

    /// The peer closes its side of the connection
    pub fn peer_close(&mut self, socket: SocketId) {
        let entry = self.socket(socket);
        if entry.status == Some(SocketStatus::Established) {
            entry.status = Some(SocketStatus::CloseWait);
        }
    }

    /// Force the status register to a value
    pub fn force_status(&mut self, socket: SocketId, status: SocketStatus) {
        self.socket(socket).status = Some(status);
    }

    /// The next `receive` fails
    pub fn fail_next_receive(&mut self, socket: SocketId) {
        self.socket(socket).fail_next_receive = true;
    }

    /// The next `send` fails
    pub fn fail_next_send(&mut self, socket: SocketId) {
        self.socket(socket).fail_next_send = true;
    }

    /// The next `count` sends report `WouldBlock`
    pub fn block_sends(&mut self, socket: SocketId, count: usize) {
        self.socket(socket).blocked_sends = count;
    }

    /// The next `count` opens fail
    pub fn fail_opens(&mut self, socket: SocketId, count: usize) {
        self.socket(socket).failing_opens = count;
    }

    /// The next `count` listen commands fail
    pub fn fail_listens(&mut self, socket: SocketId, count: usize) {
        self.socket(socket).failing_listens = count;
    }

    /// The next `count` disconnects fail
    pub fn fail_shutdowns(&mut self, socket: SocketId, count: usize) {
        self.socket(socket).failing_shutdowns = count;
    }

    /// Current status register value without side effects
    pub fn status_of(&self, socket: SocketId) -> SocketStatus {
        self.sockets
            .get(&socket)
            .and_then(|s| s.status)
            .unwrap_or(SocketStatus::Closed)
    }

    /// Port the socket was last opened on
    pub fn port_of(&self, socket: SocketId) -> Option<u16> {
        self.sockets.get(&socket).map(|s| s.port)
    }

    /// Every frame sent on `socket`, decoded as UTF-8 (lossy)
    pub fn sent_frames(&self, socket: SocketId) -> Vec<String> {
        self.sockets
            .get(&socket)
            .map(|s| {
                s.sent
                    .iter()
                    .map(|frame| String::from_utf8_lossy(frame).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drain the frames sent on `socket`
    pub fn take_sent(&mut self, socket: SocketId) -> Vec<String> {
        let frames = self.sent_frames(socket);
        self.socket(socket).sent.clear();
        frames
    }

    /// Bytes the peer wrote that have not been read yet
    pub fn pending_inbound(&self, socket: SocketId) -> usize {
        self.sockets.get(&socket).map_or(0, |s| s.inbound.len())
    }

    /// Number of `open_listener` calls on `socket`
    pub fn open_calls(&self, socket: SocketId) -> usize {
        self.sockets.get(&socket).map_or(0, |s| s.open_calls)
    }

    /// Number of `listen` calls on `socket`
    pub fn listen_calls(&self, socket: SocketId) -> usize {
        self.sockets.get(&socket).map_or(0, |s| s.listen_calls)
    }

    /// Number of `shutdown` calls on `socket`
    pub fn shutdown_calls(&self, socket: SocketId) -> usize {
        self.sockets.get(&socket).map_or(0, |s| s.shutdown_calls)
    }

    /// Number of `close` calls on `socket`
    pub fn close_calls(&self, socket: SocketId) -> usize {
        self.sockets.get(&socket).map_or(0, |s| s.close_calls)
    }
}

impl SocketProvider for MockSocketProvider {
    type Error = MockSocketError;

    fn open_listener(&mut self, socket: SocketId, port: u16) -> Result<(), MockSocketError> {
        let entry = self.socket(socket);
        entry.open_calls += 1;
        if entry.failing_opens > 0 {
            entry.failing_opens -= 1;
            return Err(MockSocketError::Injected);
        }
        entry.port = port;
        entry.status = Some(SocketStatus::Init);
        entry.inbound.clear();
        Ok(())
    }

    fn listen(&mut self, socket: SocketId) -> Result<(), MockSocketError> {
        let entry = self.socket(socket);
        entry.listen_calls += 1;
        if entry.status != Some(SocketStatus::Init) {
            return Err(MockSocketError::NotOpen(socket));
        }
        if entry.failing_listens > 0 {
            entry.failing_listens -= 1;
            return Err(MockSocketError::Injected);
        }
        entry.status = Some(SocketStatus::Listen);
        Ok(())
    }

    fn status(&mut self, socket: SocketId) -> SocketStatus {
        self.status_of(socket)
    }

    fn readable_bytes(&mut self, socket: SocketId) -> usize {
        self.pending_inbound(socket)
    }

    fn receive(&mut self, socket: SocketId, buffer: &mut [u8]) -> Transfer<MockSocketError> {
        let entry = self.socket(socket);
        if entry.status != Some(SocketStatus::Established) {
            return Transfer::Failed(MockSocketError::NotOpen(socket));
        }
        if entry.fail_next_receive {
            entry.fail_next_receive = false;
            return Transfer::Failed(MockSocketError::Injected);
        }
        if entry.inbound.is_empty() {
            return Transfer::WouldBlock;
        }

        let count = buffer.len().min(entry.inbound.len());
        for (slot, byte) in buffer.iter_mut().zip(entry.inbound.drain(..count)) {
            *slot = byte;
        }
        Transfer::Complete(count)
    }

    fn send(&mut self, socket: SocketId, data: &[u8]) -> Transfer<MockSocketError> {
        let entry = self.socket(socket);
        if entry.status != Some(SocketStatus::Established) {
            return Transfer::Failed(MockSocketError::NotOpen(socket));
        }
        if entry.fail_next_send {
            entry.fail_next_send = false;
            return Transfer::Failed(MockSocketError::Injected);
        }
        if entry.blocked_sends > 0 {
            entry.blocked_sends -= 1;
            return Transfer::WouldBlock;
        }
        entry.sent.push(data.to_vec());
        Transfer::Complete(data.len())
    }

    fn shutdown(&mut self, socket: SocketId) -> Result<(), MockSocketError> {
        let entry = self.socket(socket);
        entry.shutdown_calls += 1;
        if entry.failing_shutdowns > 0 {
            entry.failing_shutdowns -= 1;
            return Err(MockSocketError::Injected);
        }
        entry.status = Some(SocketStatus::Closed);
        entry.inbound.clear();
        Ok(())
    }

    fn close(&mut self, socket: SocketId) {
        let entry = self.socket(socket);
        entry.close_calls += 1;
        entry.status = Some(SocketStatus::Closed);
        entry.inbound.clear();
    }
}

/// Link whose state is flipped by the test
#[derive(Debug, Clone)]
pub struct MockLink {
    up: Arc<AtomicBool>,
}

impl MockLink {
    /// Create a link in the given state
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
        }
    }

    /// Plug or unplug the cable
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

impl LinkProvider for MockLink {
    fn link_up(&mut self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

/// Address client replaying a script of lease outcomes
///
/// Once the script is exhausted every step repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedAddress {
    script: VecDeque<LeaseStatus>,
    fallback: LeaseStatus,
    /// Number of `restart` calls
    pub restarts: usize,
    /// Number of `stop` calls
    pub stops: usize,
}

impl ScriptedAddress {
    /// Replay `script`, then repeat `fallback`
    pub fn new(script: impl IntoIterator<Item = LeaseStatus>, fallback: LeaseStatus) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            restarts: 0,
            stops: 0,
        }
    }
}

impl AddressProvider for ScriptedAddress {
    fn step(&mut self) -> LeaseStatus {
        self.script.pop_front().unwrap_or(self.fallback)
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_shared_between_clones() {
        let clock = MockClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_secs(2));
        assert_eq!(clock.get_time_us(), 2_000_000);
        assert_eq!(clock.elapsed_since(500_000), Duration::from_micros(1_500_000));
    }

    #[test]
    fn test_mock_socket_lifecycle() {
        let mut sockets = MockSocketProvider::new();
        assert!(!sockets.connect_peer(1));

        sockets.open_listener(1, 5000).unwrap();
        sockets.listen(1).unwrap();
        assert!(sockets.connect_peer(1));

        sockets.push_inbound(1, b"HB#");
        let mut buffer = [0u8; 2];
        assert_eq!(sockets.receive(1, &mut buffer), Transfer::Complete(2));
        assert_eq!(sockets.readable_bytes(1), 1);

        assert_eq!(sockets.send(1, b"S1#"), Transfer::Complete(3));
        assert_eq!(sockets.take_sent(1), vec!["S1#".to_string()]);
        assert!(sockets.sent_frames(1).is_empty());

        sockets.peer_close(1);
        assert_eq!(sockets.status(1), SocketStatus::CloseWait);
    }

    #[test]
    fn test_scripted_address_falls_back() {
        let mut address = ScriptedAddress::new([LeaseStatus::Failed], LeaseStatus::Leased);
        assert_eq!(address.step(), LeaseStatus::Failed);
        assert_eq!(address.step(), LeaseStatus::Leased);
        assert_eq!(address.step(), LeaseStatus::Leased);
    }
}
