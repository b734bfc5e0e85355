// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fan speed controller

use tracing::{debug, info, trace, warn};
use ventlink_server::{Message, MessageType};

use crate::actuator::SpeedActuator;
use crate::error::{ControlError, Result};

/// Highest accepted speed
pub const MAX_SPEED: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlStats {
    pub processed: u64,
    pub speed_changes: u64,
    pub rejected: u64,
    pub idle_waits: u64,
}

/// Holds the current speed and answers every command with it
pub struct VentControl<A> {
    speed: u8,
    actuator: A,
    stats: ControlStats,
}

impl<A: SpeedActuator> VentControl<A> {
    /// Start at `initial_speed` and drive the actuator to match
    pub fn new(initial_speed: u8, mut actuator: A) -> Result<Self> {
        if initial_speed > MAX_SPEED {
            return Err(ControlError::InvalidSpeed(i32::from(initial_speed)));
        }
        actuator.apply(initial_speed)?;
        info!("[CONTROL] Controller started at speed {}", initial_speed);
        Ok(Self {
            speed: initial_speed,
            actuator,
            stats: ControlStats::default(),
        })
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn stats(&self) -> ControlStats {
        self.stats
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Process one inbound message, returning the reply for its client
    ///
    /// Every message gets exactly one `CurrentSpeed` reply, including rejected
    /// speed requests (which report the unchanged speed).
    pub fn handle(&mut self, message: &Message) -> Message {
        self.stats.processed += 1;
        debug!(
            "[CONTROL] Message from client {}: {:?} {}",
            message.client, message.message_type, message.value
        );

        if message.message_type == MessageType::SetSpeed {
            if let Err(e) = self.set_speed(message.value) {
                self.stats.rejected += 1;
                warn!("[CONTROL] Client {}: {}", message.client, e);
            }
        }

        Message::new(message.client, MessageType::CurrentSpeed, i32::from(self.speed))
    }

    fn set_speed(&mut self, value: i32) -> Result<()> {
        let speed = u8::try_from(value)
            .ok()
            .filter(|s| *s <= MAX_SPEED)
            .ok_or(ControlError::InvalidSpeed(value))?;

        self.actuator.apply(speed)?;
        if speed != self.speed {
            self.stats.speed_changes += 1;
            info!("[CONTROL] Speed {} -> {}", self.speed, speed);
        }
        self.speed = speed;
        Ok(())
    }

    /// Duties run whenever the inbound wait times out
    pub fn periodic(&mut self) {
        self.stats.idle_waits += 1;
        trace!("[CONTROL] Idle, speed {}", self.speed);
    }
}
