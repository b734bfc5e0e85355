// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire protocol: `#`-terminated text frames
//!
//! Client → server: `GET#`, `SET0#`..`SET3#`, `HB#`.
//! Server → client: `S<int>#` (current speed), `T<int>#` (remaining time), `HB#`.

use core::fmt::Write;

use heapless::String;

use crate::core::{Message, MessageType, SessionId};
use crate::session::Session;

/// Frame terminator
pub const TERMINATOR: u8 = b'#';

/// Heartbeat frame sent when a session has been quiet for too long
pub const HEARTBEAT_FRAME: &[u8] = b"HB#";

/// Longest encoded reply: sign + 10 digits + prefix + terminator
pub const MAX_REPLY_LEN: usize = 16;

/// A recognized client command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetStatus,
    SetSpeed(u8),
    KeepAlive,
}

impl Command {
    /// Classify a token (the bytes before the terminator)
    ///
    /// Surrounding CR/LF is ignored so line-oriented clients work unchanged.
    /// Anything else must match exactly.
    pub fn parse_token(token: &[u8]) -> Option<Self> {
        match trim_line_endings(token) {
            b"GET" => Some(Command::GetStatus),
            b"SET0" => Some(Command::SetSpeed(0)),
            b"SET1" => Some(Command::SetSpeed(1)),
            b"SET2" => Some(Command::SetSpeed(2)),
            b"SET3" => Some(Command::SetSpeed(3)),
            b"HB" => Some(Command::KeepAlive),
            _ => None,
        }
    }

    pub fn message_type(self) -> MessageType {
        match self {
            Command::GetStatus => MessageType::GetStatus,
            Command::SetSpeed(_) => MessageType::SetSpeed,
            Command::KeepAlive => MessageType::KeepAlive,
        }
    }

    /// Relay message for this command, originating from `client`
    pub fn to_message(self, client: SessionId) -> Message {
        let value = match self {
            Command::SetSpeed(speed) => i32::from(speed),
            Command::GetStatus | Command::KeepAlive => 0,
        };
        Message::new(client, self.message_type(), value)
    }
}

fn trim_line_endings(mut token: &[u8]) -> &[u8] {
    while let [b'\r' | b'\n', rest @ ..] = token {
        token = rest;
    }
    while let [rest @ .., b'\r' | b'\n'] = token {
        token = rest;
    }
    token
}

/// Outcome of one [`extract_frame`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// A complete, recognized frame was consumed
    Command(Command),
    /// A complete but unrecognized frame was consumed
    Discarded,
    /// No terminator yet; the buffer is untouched
    Incomplete,
    /// The buffer filled up without a terminator and was reset
    Overflow,
}

impl FrameResult {
    /// More frames may follow in the same buffer
    pub fn consumed_frame(&self) -> bool {
        matches!(self, FrameResult::Command(_) | FrameResult::Discarded)
    }
}

/// Pull the first terminated frame out of the session's receive buffer
///
/// Only the bytes up to and including the terminator are consumed, so callers
/// loop until [`FrameResult::consumed_frame`] is false to drain several frames
/// that arrived in one read.
pub fn extract_frame(session: &mut Session) -> FrameResult {
    let buffer = session.received();
    match buffer.iter().position(|&b| b == TERMINATOR) {
        Some(end) => {
            let command = Command::parse_token(&buffer[..end]);
            session.consume_received(end + 1);
            command.map_or(FrameResult::Discarded, FrameResult::Command)
        }
        None if session.recv_space() == 0 => {
            session.clear_received();
            FrameResult::Overflow
        }
        None => FrameResult::Incomplete,
    }
}

/// Encode a controller reply for the wire
///
/// Returns `None` for message types that are never sent to clients.
pub fn encode_reply(message: &Message) -> Option<String<MAX_REPLY_LEN>> {
    let prefix = match message.message_type {
        MessageType::CurrentSpeed => 'S',
        MessageType::RemainingTime => 'T',
        _ => return None,
    };
    let mut frame = String::new();
    write!(frame, "{}{}#", prefix, message.value).ok()?;
    Some(frame)
}
