// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session pool / multiplexer
//!
//! Owns every [`Session`] and is the only component issuing transport calls.
//! One poll cycle:
//! 1. pop at most one reply from the outbound relay queue (non-blocking)
//! 2. for each session in fixed order: stage the reply if addressed to it,
//!    otherwise stage a heartbeat when due; step the state machine; drain every
//!    complete frame onto the inbound relay queue

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace, warn};
use ventlink_hal::{SocketProvider, TimeProvider};

use crate::core::config::HARDWARE_SOCKET_COUNT;
use crate::core::{Message, Result, ServerConfig, SessionId};
use crate::frame::{encode_reply, extract_frame, FrameResult, HEARTBEAT_FRAME};
use crate::gate::StartupGate;
use crate::relay::{ChannelStats, RelayError, ServerEndpoint};
use crate::session::{Session, SessionState};
use crate::state_machine::{step, CloseReason, StepPolicy, StepReport};
use crate::supervisor::NetworkStatus;

/// Upper bound on pool slots (one hardware socket is reserved)
pub const MAX_SESSIONS: usize = HARDWARE_SOCKET_COUNT - 1;

/// How often a gate wait re-checks the shutdown flag
const GATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Counters accumulated over the pool's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub cycles: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub idle_timeouts: u64,
    pub frames_forwarded: u64,
    pub keepalives_received: u64,
    pub frames_discarded: u64,
    pub buffer_overflows: u64,
    pub inbound_dropped: u64,
    pub replies_sent: u64,
    pub replies_dropped: u64,
    pub heartbeats_sent: u64,
}

/// Read-only view of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub state: SessionState,
    pub is_open: bool,
    pub buffered: usize,
    pub send_pending: bool,
}

/// Fixed-size pool of sessions driven by one poll loop
pub struct SessionPool<S, T> {
    config: ServerConfig,
    policy: StepPolicy,
    sessions: heapless::Vec<Session, MAX_SESSIONS>,
    sockets: S,
    clock: T,
    relay: ServerEndpoint,
    stats: PoolStats,
    initialized: bool,
}

impl<S: SocketProvider, T: TimeProvider> SessionPool<S, T> {
    /// Build the pool; sessions are created closed and not yet opened
    pub fn new(config: ServerConfig, sockets: S, clock: T, relay: ServerEndpoint) -> Result<Self> {
        config.validate()?;

        let mut sessions = heapless::Vec::new();
        for id in config.session_ids() {
            if sessions
                .push(Session::new(id, config.listen_port, config.buffer_size))
                .is_err()
            {
                return Err(crate::core::ServerError::Config(format!(
                    "at most {} sessions are supported",
                    MAX_SESSIONS
                )));
            }
        }

        Ok(Self {
            policy: StepPolicy {
                idle_timeout: config.idle_timeout,
            },
            config,
            sessions,
            sockets,
            clock,
            relay,
            stats: PoolStats::default(),
            initialized: false,
        })
    }

    /// Open a listening socket for every slot
    ///
    /// Slots whose open fails stay closed and are retried by the poll loop.
    pub fn initialize(&mut self) {
        for session in self.sessions.iter_mut() {
            match self
                .sockets
                .open_listener(session.id(), session.listen_port())
            {
                Ok(()) => session.set_state(SessionState::Init),
                Err(e) => warn!(
                    "[SERVER] Session {} open failed, will retry: {:?}",
                    session.id(),
                    e
                ),
            }
        }
        self.initialized = true;
        info!(
            "[SERVER] Session pool initialized: {} sessions on port {}",
            self.sessions.len(),
            self.config.listen_port
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run one multiplexer cycle over every session
    pub fn poll_once(&mut self) {
        let Self {
            config,
            policy,
            sessions,
            sockets,
            clock,
            relay,
            stats,
            ..
        } = self;

        stats.cycles += 1;
        let reply = relay.replies.try_pop();
        let mut reply_staged = false;

        for session in sessions.iter_mut() {
            match reply {
                Some(message) if message.client == session.id() => {
                    reply_staged = stage_reply(session, &message, stats);
                }
                _ => {
                    if session.is_open()
                        && !session.has_pending_send()
                        && clock.elapsed_since(session.last_send_at()) > config.heartbeat_interval
                        && session.set_send(HEARTBEAT_FRAME)
                    {
                        stats.heartbeats_sent += 1;
                        trace!("[SERVER] Session {} heartbeat staged", session.id());
                    }
                }
            }

            let report = step(session, sockets, clock, policy);
            record_step(&report, stats);

            if session.is_open() {
                drain_frames(session, relay, stats);
            }
        }

        if let Some(message) = reply {
            if !reply_staged {
                stats.replies_dropped += 1;
                debug!(
                    "[SERVER] Dropping reply for client {}: no open session",
                    message.client
                );
            }
        }
    }

    /// Close every session at once (link loss)
    ///
    /// Returns the number of sessions that were open.
    pub fn reset_sessions(&mut self) -> usize {
        let mut closed = 0;
        for session in self.sessions.iter_mut() {
            self.sockets.close(session.id());
            if session.is_open() {
                closed += 1;
                info!(
                    "[SERVER] Session {} closed: {}",
                    session.id(),
                    CloseReason::LinkLost
                );
            }
            session.mark_closed();
        }
        self.stats.sessions_closed += closed as u64;
        closed
    }

    /// Wait for the gate, then poll until `shutdown` is set
    ///
    /// While `network` is down polling pauses and every session is closed once;
    /// sessions re-listen through the normal closed path when it comes back.
    pub fn run(&mut self, gate: &StartupGate, network: &NetworkStatus, shutdown: &AtomicBool) {
        info!("[SERVER] Waiting for network readiness");
        while !gate.wait_timeout(GATE_POLL_INTERVAL) {
            if shutdown.load(Ordering::Relaxed) {
                info!("[SERVER] Shutdown before network became ready");
                return;
            }
        }

        if !self.initialized {
            self.initialize();
        }

        let mut paused = false;
        while !shutdown.load(Ordering::Relaxed) {
            if !network.is_up() {
                if !paused {
                    let closed = self.reset_sessions();
                    warn!(
                        "[SERVER] Network down, polling paused ({} sessions closed)",
                        closed
                    );
                    paused = true;
                }
                thread::sleep(self.config.link_poll_interval);
                continue;
            }
            if paused {
                info!("[SERVER] Network back up, resuming");
                paused = false;
            }

            self.poll_once();
            if !self.config.poll_sleep.is_zero() {
                thread::sleep(self.config.poll_sleep);
            }
        }

        info!("[SERVER] Multiplexer stopped after {} cycles", self.stats.cycles);
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Inbound relay queue occupancy
    pub fn inbound_stats(&self) -> ChannelStats {
        self.relay.commands.stats()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|s| SessionSnapshot {
                id: s.id(),
                state: s.state(),
                is_open: s.is_open(),
                buffered: s.recv_len(),
                send_pending: s.has_pending_send(),
            })
            .collect()
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_open()).count()
    }

    pub fn transport(&self) -> &S {
        &self.sockets
    }

    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.sockets
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }
}

fn stage_reply(session: &mut Session, message: &Message, stats: &mut PoolStats) -> bool {
    if !session.is_open() {
        return false;
    }
    let Some(frame) = encode_reply(message) else {
        warn!(
            "[SERVER] Session {} reply type {:?} has no wire encoding",
            session.id(),
            message.message_type
        );
        return false;
    };
    if !session.set_send(frame.as_bytes()) {
        return false;
    }
    stats.replies_sent += 1;
    trace!("[SERVER] Session {} reply staged: {}", session.id(), frame);
    true
}

fn record_step(report: &StepReport, stats: &mut PoolStats) {
    if report.established {
        stats.sessions_opened += 1;
    }
    if let Some(reason) = report.closed {
        stats.sessions_closed += 1;
        if reason == CloseReason::IdleTimeout {
            stats.idle_timeouts += 1;
        }
    }
}

fn drain_frames(session: &mut Session, relay: &ServerEndpoint, stats: &mut PoolStats) {
    loop {
        match extract_frame(session) {
            FrameResult::Command(command) => {
                let message_type = command.message_type();
                if !message_type.is_forwarded() {
                    stats.keepalives_received += 1;
                    continue;
                }
                match relay.commands.push(command.to_message(session.id())) {
                    Ok(()) => {
                        stats.frames_forwarded += 1;
                        debug!("[SERVER] Session {} forwarded {:?}", session.id(), command);
                    }
                    Err(RelayError::Full(_)) => stats.inbound_dropped += 1,
                    Err(RelayError::Disconnected) => {
                        stats.inbound_dropped += 1;
                        warn!(
                            "[SERVER] Session {} command dropped: consumer gone",
                            session.id()
                        );
                    }
                }
            }
            FrameResult::Discarded => {
                stats.frames_discarded += 1;
                debug!("[SERVER] Session {} discarded unrecognized frame", session.id());
            }
            FrameResult::Overflow => {
                stats.buffer_overflows += 1;
                warn!(
                    "[SERVER] Session {} receive buffer full without terminator, reset",
                    session.id()
                );
                return;
            }
            FrameResult::Incomplete => return,
        }
    }
}
