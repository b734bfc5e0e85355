// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport session: one pool slot bound to one socket number
//!
//! Holds the per-connection buffers and liveness timestamps. The session never
//! talks to the transport itself; [`crate::state_machine::step`] does that.

use heapless::Vec;

use crate::core::SessionId;

/// Compile-time capacity of the receive and send buffers
pub const BUFFER_SIZE: usize = 128;

/// Position of a session in its listen / serve / close cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Socket opened, listen not yet accepted
    Init,
    /// Waiting for a peer
    Listening,
    /// Peer connected; the only state in which the session is open
    Established,
    /// Peer closed its side, disconnect pending
    CloseWait,
    /// Socket closed, reopen pending
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Init => "init",
            SessionState::Listening => "listening",
            SessionState::Established => "established",
            SessionState::CloseWait => "close_wait",
            SessionState::Closed => "closed",
        }
    }
}

impl core::fmt::Display for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical client connection bound to a fixed listening slot
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    listen_port: u16,
    state: SessionState,
    /// Runtime limit on both buffers, never above [`BUFFER_SIZE`]
    capacity: usize,
    recv_buf: Vec<u8, BUFFER_SIZE>,
    send_buf: Vec<u8, BUFFER_SIZE>,
    last_recv_at: u64,
    last_send_at: u64,
}

impl Session {
    /// Create a closed session; `capacity` is clamped to [`BUFFER_SIZE`]
    pub fn new(id: SessionId, listen_port: u16, capacity: usize) -> Self {
        Self {
            id,
            listen_port,
            state: SessionState::Closed,
            capacity: capacity.clamp(1, BUFFER_SIZE),
            recv_buf: Vec::new(),
            send_buf: Vec::new(),
            last_recv_at: 0,
            last_send_at: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True only while established and no close condition has fired since entry
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Established
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last_recv_at(&self) -> u64 {
        self.last_recv_at
    }

    pub fn last_send_at(&self) -> u64 {
        self.last_send_at
    }

    /// Buffered bytes not yet framed
    pub fn received(&self) -> &[u8] {
        &self.recv_buf
    }

    pub fn recv_len(&self) -> usize {
        self.recv_buf.len()
    }

    /// Free space left in the receive buffer
    pub fn recv_space(&self) -> usize {
        self.capacity.saturating_sub(self.recv_buf.len())
    }

    /// Append bytes read from the transport, returning how many fit
    pub fn append_received(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.recv_space());
        // Cannot fail: count is bounded by the remaining runtime capacity
        let _ = self.recv_buf.extend_from_slice(&bytes[..count]);
        count
    }

    /// Drop the first `count` buffered bytes
    pub fn consume_received(&mut self, count: usize) {
        let count = count.min(self.recv_buf.len());
        let remaining = self.recv_buf.len() - count;
        self.recv_buf.copy_within(count.., 0);
        self.recv_buf.truncate(remaining);
    }

    pub fn clear_received(&mut self) {
        self.recv_buf.clear();
    }

    /// Pending outbound frame (empty when nothing is in flight)
    pub fn pending_send(&self) -> &[u8] {
        &self.send_buf
    }

    pub fn has_pending_send(&self) -> bool {
        !self.send_buf.is_empty()
    }

    /// Replace the pending outbound frame
    ///
    /// Last write wins: an unflushed previous frame is overwritten. Returns
    /// `false` (and leaves the buffer untouched) when the frame does not fit.
    pub fn set_send(&mut self, frame: &[u8]) -> bool {
        if frame.len() > self.capacity {
            return false;
        }
        self.send_buf.clear();
        let _ = self.send_buf.extend_from_slice(frame);
        true
    }

    /// Drop the first `count` bytes of the pending frame after a (partial) send
    pub fn consume_sent(&mut self, count: usize) {
        let count = count.min(self.send_buf.len());
        let remaining = self.send_buf.len() - count;
        self.send_buf.copy_within(count.., 0);
        self.send_buf.truncate(remaining);
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn touch_recv(&mut self, now_us: u64) {
        self.last_recv_at = now_us;
    }

    pub(crate) fn touch_send(&mut self, now_us: u64) {
        self.last_send_at = now_us;
    }

    /// Enter ESTABLISHED: open the session and reset both timestamps
    pub(crate) fn mark_established(&mut self, now_us: u64) {
        self.state = SessionState::Established;
        self.recv_buf.clear();
        self.send_buf.clear();
        self.last_recv_at = now_us;
        self.last_send_at = now_us;
    }

    /// Close the session and discard both buffers
    pub(crate) fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
        self.recv_buf.clear();
        self.send_buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_closed() {
        let session = Session::new(3, 5000, BUFFER_SIZE);
        assert_eq!(session.id(), 3);
        assert_eq!(session.listen_port(), 5000);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.is_open());
        assert_eq!(session.recv_space(), BUFFER_SIZE);
    }

    #[test]
    fn test_capacity_is_clamped() {
        let session = Session::new(1, 5000, 4096);
        assert_eq!(session.capacity(), BUFFER_SIZE);
    }

    #[test]
    fn test_append_stops_at_capacity() {
        let mut session = Session::new(1, 5000, 8);
        assert_eq!(session.append_received(b"GET#SET1#"), 8);
        assert_eq!(session.received(), b"GET#SET1");
        assert_eq!(session.recv_space(), 0);
        assert_eq!(session.append_received(b"#"), 0);
    }

    #[test]
    fn test_consume_received_keeps_tail() {
        let mut session = Session::new(1, 5000, BUFFER_SIZE);
        session.append_received(b"GET#SE");
        session.consume_received(4);
        assert_eq!(session.received(), b"SE");
        session.consume_received(10);
        assert_eq!(session.recv_len(), 0);
    }

    #[test]
    fn test_set_send_last_write_wins() {
        let mut session = Session::new(1, 5000, BUFFER_SIZE);
        assert!(session.set_send(b"HB#"));
        assert!(session.set_send(b"S2#"));
        assert_eq!(session.pending_send(), b"S2#");

        session.consume_sent(1);
        assert_eq!(session.pending_send(), b"2#");
        session.consume_sent(2);
        assert!(!session.has_pending_send());
    }

    #[test]
    fn test_set_send_rejects_oversized_frame() {
        let mut session = Session::new(1, 5000, 4);
        session.set_send(b"HB#");
        assert!(!session.set_send(b"S12345#"));
        assert_eq!(session.pending_send(), b"HB#");
    }

    #[test]
    fn test_established_and_closed_transitions() {
        let mut session = Session::new(1, 5000, BUFFER_SIZE);
        session.append_received(b"stale");
        session.mark_established(42);
        assert!(session.is_open());
        assert_eq!(session.recv_len(), 0);
        assert_eq!(session.last_recv_at(), 42);
        assert_eq!(session.last_send_at(), 42);

        session.append_received(b"SE");
        session.set_send(b"HB#");
        session.mark_closed();
        assert!(!session.is_open());
        assert_eq!(session.recv_len(), 0);
        assert!(!session.has_pending_send());
    }
}
