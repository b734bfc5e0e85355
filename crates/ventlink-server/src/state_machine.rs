// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-session poll-driven automaton
//!
//! [`step`] is called once per session per multiplexer cycle. It reads the
//! transport status register and performs at most one action for that state,
//! so per-cycle work is bounded and one slow session cannot starve the others.
//!
//! ```text
//! INIT ──listen──► LISTENING ──peer──► ESTABLISHED ──peer close──► CLOSE_WAIT
//!   ▲                                       │ timeout / I/O error        │ shutdown
//!   └───────────────open──────────── CLOSED ◄────────────────────────────┘
//! ```

use core::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};
use ventlink_hal::{SocketProvider, SocketStatus, TimeProvider, Transfer};

use crate::session::{Session, SessionState, BUFFER_SIZE};

/// Why a session left ESTABLISHED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Nothing received for longer than the idle timeout
    IdleTimeout,
    /// The transport reported a receive error
    ReceiveError,
    /// The transport reported a send error
    SendError,
    /// The peer closed its side
    PeerClosed,
    /// The status register reported an error
    SocketError,
    /// The network went down and the pool was reset
    LinkLost,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CloseReason::IdleTimeout => "idle timeout",
            CloseReason::ReceiveError => "receive error",
            CloseReason::SendError => "send error",
            CloseReason::PeerClosed => "peer closed",
            CloseReason::SocketError => "socket error",
            CloseReason::LinkLost => "link lost",
        };
        f.write_str(text)
    }
}

/// What a single [`step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The session entered ESTABLISHED during this step
    pub established: bool,
    /// Bytes appended to the receive buffer
    pub received: usize,
    /// The pending frame was fully flushed
    pub flushed: bool,
    /// The session was closed during this step
    pub closed: Option<CloseReason>,
}

/// Liveness policy applied while a session is established
#[derive(Debug, Clone, Copy)]
pub struct StepPolicy {
    pub idle_timeout: Duration,
}

/// Advance one session by one poll
pub fn step<S, T>(
    session: &mut Session,
    sockets: &mut S,
    clock: &T,
    policy: &StepPolicy,
) -> StepReport
where
    S: SocketProvider,
    T: TimeProvider,
{
    let id = session.id();
    let mut report = StepReport::default();

    match sockets.status(id) {
        SocketStatus::Init => {
            // A socket back in INIT/LISTEN has lost its peer
            report.closed = close_if_open(session, CloseReason::SocketError);
            match sockets.listen(id) {
                Ok(()) => {
                    session.set_state(SessionState::Listening);
                    debug!("[SERVER] Session {} listening on port {}", id, session.listen_port());
                }
                Err(e) => {
                    session.set_state(SessionState::Init);
                    warn!("[SERVER] Session {} listen failed, retrying: {:?}", id, e);
                }
            }
        }
        SocketStatus::Listen => {
            report.closed = close_if_open(session, CloseReason::SocketError);
            session.set_state(SessionState::Listening);
        }
        SocketStatus::Established => {
            if !session.is_open() {
                session.mark_established(clock.get_time_us());
                report.established = true;
                info!("[SERVER] Session {} connected", id);
            }
            serve(session, sockets, clock, policy, &mut report);
        }
        SocketStatus::CloseWait => match sockets.shutdown(id) {
            Ok(()) => {
                report.closed = close_if_open(session, CloseReason::PeerClosed);
                session.set_state(SessionState::Closed);
            }
            Err(e) => {
                report.closed = close_if_open(session, CloseReason::PeerClosed);
                session.set_state(SessionState::CloseWait);
                warn!("[SERVER] Session {} disconnect failed, retrying: {:?}", id, e);
            }
        },
        SocketStatus::Closed => {
            report.closed = close_if_open(session, CloseReason::PeerClosed);
            match sockets.open_listener(id, session.listen_port()) {
                Ok(()) => session.set_state(SessionState::Init),
                Err(e) => {
                    session.set_state(SessionState::Closed);
                    warn!("[SERVER] Session {} reopen failed, retrying: {:?}", id, e);
                }
            }
        }
        SocketStatus::Error => {
            sockets.close(id);
            report.closed = close_if_open(session, CloseReason::SocketError);
            session.set_state(SessionState::Closed);
        }
    }

    report
}

fn serve<S, T>(
    session: &mut Session,
    sockets: &mut S,
    clock: &T,
    policy: &StepPolicy,
    report: &mut StepReport,
) where
    S: SocketProvider,
    T: TimeProvider,
{
    let id = session.id();
    let readable = sockets.readable_bytes(id);

    if readable > 0 {
        let want = readable.min(session.recv_space());
        if want > 0 {
            let mut scratch = [0u8; BUFFER_SIZE];
            match sockets.receive(id, &mut scratch[..want]) {
                Transfer::Complete(n) => {
                    report.received = session.append_received(&scratch[..n]);
                    session.touch_recv(clock.get_time_us());
                }
                Transfer::WouldBlock => {}
                Transfer::Failed(e) => {
                    warn!("[SERVER] Session {} receive failed: {:?}", id, e);
                    force_close(session, sockets, CloseReason::ReceiveError, report);
                    return;
                }
            }
        }
    } else if clock.elapsed_since(session.last_recv_at()) > policy.idle_timeout {
        force_close(session, sockets, CloseReason::IdleTimeout, report);
        return;
    }

    if session.has_pending_send() {
        match sockets.send(id, session.pending_send()) {
            Transfer::Complete(n) => {
                session.consume_sent(n);
                session.touch_send(clock.get_time_us());
                report.flushed = !session.has_pending_send();
            }
            Transfer::WouldBlock => {}
            Transfer::Failed(e) => {
                warn!("[SERVER] Session {} send failed: {:?}", id, e);
                force_close(session, sockets, CloseReason::SendError, report);
            }
        }
    }
}

/// Close the socket and the session regardless of transport state
pub(crate) fn force_close<S: SocketProvider>(
    session: &mut Session,
    sockets: &mut S,
    reason: CloseReason,
    report: &mut StepReport,
) {
    sockets.close(session.id());
    report.closed = close_if_open(session, reason);
    session.set_state(SessionState::Closed);
}

fn close_if_open(session: &mut Session, reason: CloseReason) -> Option<CloseReason> {
    if !session.is_open() {
        return None;
    }
    session.mark_closed();
    info!("[SERVER] Session {} closed: {}", session.id(), reason);
    Some(reason)
}
