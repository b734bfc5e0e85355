// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core types used across all server modules

use thiserror::Error;
use ventlink_hal::SocketId;

/// Session identifier
///
/// Equal to the socket number of the slot, and doubles as the routing key for
/// replies coming back from the controller.
pub type SessionId = SocketId;

/// Kind of message carried over the relay queues
///
/// Discriminants match the numeric codes used on the controller side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Placeholder, never forwarded
    NoMessage = 0,
    /// Client asks for the current state
    GetStatus = 1,
    /// Controller reports the current speed
    CurrentSpeed = 2,
    /// Client requests a new speed
    SetSpeed = 3,
    /// Controller reports the remaining run time
    RemainingTime = 4,
    /// Client liveness frame, consumed by the multiplexer
    KeepAlive = 5,
}

impl MessageType {
    /// Liveness-only messages are consumed by the multiplexer and never relayed
    pub fn is_forwarded(self) -> bool {
        !matches!(self, MessageType::NoMessage | MessageType::KeepAlive)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::NoMessage),
            1 => Ok(MessageType::GetStatus),
            2 => Ok(MessageType::CurrentSpeed),
            3 => Ok(MessageType::SetSpeed),
            4 => Ok(MessageType::RemainingTime),
            5 => Ok(MessageType::KeepAlive),
            _ => Err(()),
        }
    }
}

/// The relay unit exchanged between the multiplexer and the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Originating (inbound) or destination (outbound) session
    pub client: SessionId,
    pub message_type: MessageType,
    pub value: i32,
}

impl Message {
    pub fn new(client: SessionId, message_type: MessageType, value: i32) -> Self {
        Self {
            client,
            message_type,
            value,
        }
    }
}

/// Errors that can occur while configuring or starting the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keepalive_is_not_forwarded() {
        assert!(!MessageType::KeepAlive.is_forwarded());
        assert!(!MessageType::NoMessage.is_forwarded());
        assert!(MessageType::GetStatus.is_forwarded());
        assert!(MessageType::SetSpeed.is_forwarded());
    }

    #[test]
    fn test_message_type_codes() {
        for code in 0u8..=5 {
            let message_type = MessageType::try_from(code).unwrap();
            assert_eq!(message_type as u8, code);
        }
        assert!(MessageType::try_from(6).is_err());
    }
}
