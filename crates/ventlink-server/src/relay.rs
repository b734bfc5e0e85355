// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Relay queues between the multiplexer and the control consumer
//!
//! Two bounded FIFO channels of [`Message`]:
//! - inbound: parsed client commands, multiplexer → consumer
//! - outbound: replies addressed by session id, consumer → multiplexer
//!
//! # Backpressure
//! - `push()` waits at most the configured enqueue timeout, then drops the item
//! - the network loop is never blocked past that timeout

use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use thiserror::Error;
use tracing::warn;

use crate::core::Message;

/// Failure to hand a message across a relay queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay queue full, message dropped: {0:?}")]
    Full(Message),
    #[error("relay queue disconnected")]
    Disconnected,
}

/// Producer side of one relay queue
#[derive(Debug, Clone)]
pub struct RelaySender {
    name: &'static str,
    tx: Sender<Message>,
    enqueue_timeout: Duration,
}

impl RelaySender {
    /// Push with the short enqueue timeout; on failure the message is dropped
    pub fn push(&self, message: Message) -> Result<(), RelayError> {
        match self.tx.send_timeout(message, self.enqueue_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(message)) => {
                warn!(
                    "[RELAY] {} queue full, dropping message for client {}",
                    self.name, message.client
                );
                Err(RelayError::Full(message))
            }
            Err(SendTimeoutError::Disconnected(_)) => Err(RelayError::Disconnected),
        }
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats::from_sender(&self.tx)
    }
}

/// Consumer side of one relay queue
#[derive(Debug, Clone)]
pub struct RelayReceiver {
    rx: Receiver<Message>,
}

impl RelayReceiver {
    /// Non-blocking pop
    pub fn try_pop(&self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Pop, waiting at most `timeout`
    ///
    /// `Ok(None)` means the wait timed out.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<Message>, RelayError> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RelayError::Disconnected),
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Multiplexer's ends: pushes commands, pops replies
#[derive(Debug, Clone)]
pub struct ServerEndpoint {
    pub commands: RelaySender,
    pub replies: RelayReceiver,
}

/// Consumer's ends: pops commands, pushes replies
#[derive(Debug, Clone)]
pub struct ConsumerEndpoint {
    pub commands: RelayReceiver,
    pub replies: RelaySender,
}

fn relay_queue(
    name: &'static str,
    capacity: usize,
    enqueue_timeout: Duration,
) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = bounded(capacity);
    (
        RelaySender {
            name,
            tx,
            enqueue_timeout,
        },
        RelayReceiver { rx },
    )
}

/// Create both relay queues with the same capacity and enqueue timeout
pub fn relay_channels(
    capacity: usize,
    enqueue_timeout: Duration,
) -> (ServerEndpoint, ConsumerEndpoint) {
    let (command_tx, command_rx) = relay_queue("inbound", capacity, enqueue_timeout);
    let (reply_tx, reply_rx) = relay_queue("outbound", capacity, enqueue_timeout);
    (
        ServerEndpoint {
            commands: command_tx,
            replies: reply_rx,
        },
        ConsumerEndpoint {
            commands: command_rx,
            replies: reply_tx,
        },
    )
}

/// Statistics for monitoring channel health
#[derive(Debug, Clone, Copy)]
pub struct ChannelStats {
    pub capacity: usize,
    pub len: usize,
    pub is_full: bool,
    pub is_empty: bool,
}

impl ChannelStats {
    fn from_sender<T>(sender: &Sender<T>) -> Self {
        Self {
            capacity: sender.capacity().unwrap_or(0),
            len: sender.len(),
            is_full: sender.is_full(),
            is_empty: sender.is_empty(),
        }
    }

    /// Calculate utilization percentage (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.len as f64 / self.capacity as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MessageType;
    use std::time::Instant;

    fn message(client: u8, value: i32) -> Message {
        Message::new(client, MessageType::SetSpeed, value)
    }

    #[test]
    fn test_fifo_order() {
        let (server, consumer) = relay_channels(4, Duration::from_millis(10));
        for value in 0..3 {
            server.commands.push(message(1, value)).unwrap();
        }
        for value in 0..3 {
            assert_eq!(consumer.commands.try_pop(), Some(message(1, value)));
        }
        assert_eq!(consumer.commands.try_pop(), None);
    }

    #[test]
    fn test_full_queue_drops_after_timeout() {
        let (server, consumer) = relay_channels(2, Duration::from_millis(10));
        server.commands.push(message(1, 0)).unwrap();
        server.commands.push(message(1, 1)).unwrap();

        let started = Instant::now();
        let result = server.commands.push(message(1, 2));
        assert_eq!(result, Err(RelayError::Full(message(1, 2))));
        assert!(started.elapsed() < Duration::from_secs(1));

        // Retained items keep their order
        assert_eq!(consumer.commands.try_pop(), Some(message(1, 0)));
        assert_eq!(consumer.commands.try_pop(), Some(message(1, 1)));
        assert_eq!(consumer.commands.try_pop(), None);
    }

    #[test]
    fn test_pop_timeout() {
        let (server, consumer) = relay_channels(2, Duration::from_millis(10));
        assert_eq!(consumer.commands.pop_timeout(Duration::from_millis(5)), Ok(None));

        consumer.replies.push(message(3, 2)).unwrap();
        assert_eq!(
            server.replies.pop_timeout(Duration::from_millis(5)),
            Ok(Some(message(3, 2)))
        );
    }

    #[test]
    fn test_disconnected() {
        let (server, consumer) = relay_channels(2, Duration::from_millis(10));
        drop(server);
        assert_eq!(
            consumer.commands.pop_timeout(Duration::from_millis(5)),
            Err(RelayError::Disconnected)
        );
        assert_eq!(consumer.replies.push(message(1, 0)), Err(RelayError::Disconnected));
    }

    #[test]
    fn test_channel_stats() {
        let (server, _consumer) = relay_channels(10, Duration::from_millis(10));
        server.commands.push(message(1, 0)).unwrap();

        let stats = server.commands.stats();
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.len, 1);
        assert!(!stats.is_empty);
        assert!(!stats.is_full);
        assert_eq!(stats.utilization(), 0.1);
    }
}
