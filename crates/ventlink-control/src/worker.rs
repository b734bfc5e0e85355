// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Control worker thread
//!
//! Blocks on the inbound relay queue with a bounded wait so it stays
//! responsive to both new commands and its own periodic duties.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};
use ventlink_server::{ConsumerEndpoint, RelayError};

use crate::actuator::SpeedActuator;
use crate::controller::VentControl;
use crate::error::{ControlError, Result};

const THREAD_NAME: &str = "ventlink-control";

/// Wait for one command and answer it, or run periodic duties on timeout
///
/// Returns `Ok(true)` when a command was processed. A full reply queue drops
/// the reply (already logged by the queue); only a disconnected queue is an error.
pub fn process_next<A: SpeedActuator>(
    control: &mut VentControl<A>,
    endpoint: &ConsumerEndpoint,
    wait_timeout: Duration,
) -> Result<bool> {
    match endpoint.commands.pop_timeout(wait_timeout) {
        Ok(Some(message)) => {
            let reply = control.handle(&message);
            match endpoint.replies.push(reply) {
                Ok(()) | Err(RelayError::Full(_)) => Ok(true),
                Err(RelayError::Disconnected) => Err(ControlError::Disconnected),
            }
        }
        Ok(None) => {
            control.periodic();
            Ok(false)
        }
        Err(_) => Err(ControlError::Disconnected),
    }
}

/// Runs a [`VentControl`] on its own thread
pub struct ControlWorker<A> {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<VentControl<A>>>,
}

impl<A: SpeedActuator + Send + 'static> ControlWorker<A> {
    pub fn spawn(
        mut control: VentControl<A>,
        endpoint: ConsumerEndpoint,
        wait_timeout: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                info!("[CONTROL] Worker started (wait {:?})", wait_timeout);
                while !flag.load(Ordering::Relaxed) {
                    if let Err(e) = process_next(&mut control, &endpoint, wait_timeout) {
                        warn!("[CONTROL] Worker stopping: {}", e);
                        break;
                    }
                }
                info!(
                    "[CONTROL] Worker stopped after {} messages",
                    control.stats().processed
                );
                control
            })
            .map_err(ControlError::Spawn)?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl<A> ControlWorker<A> {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal shutdown, join, and hand the controller back
    pub fn stop(mut self) -> Option<VentControl<A>> {
        self.join()
    }

    fn join(&mut self) -> Option<VentControl<A>> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(control) => Some(control),
            Err(_) => {
                error!("[CONTROL] Worker thread panicked");
                None
            }
        }
    }
}

impl<A> Drop for ControlWorker<A> {
    fn drop(&mut self) {
        let _ = self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::NoopActuator;
    use ventlink_server::{relay_channels, Message, MessageType};

    #[test]
    fn test_process_next_replies() {
        let (server, consumer) = relay_channels(4, Duration::from_millis(5));
        let mut control = VentControl::new(1, NoopActuator).unwrap();

        server
            .commands
            .push(Message::new(4, MessageType::SetSpeed, 2))
            .unwrap();
        assert!(process_next(&mut control, &consumer, Duration::from_millis(10)).unwrap());
        assert_eq!(
            server.replies.try_pop(),
            Some(Message::new(4, MessageType::CurrentSpeed, 2))
        );
    }

    #[test]
    fn test_timeout_runs_periodic_duties() {
        let (_server, consumer) = relay_channels(4, Duration::from_millis(5));
        let mut control = VentControl::new(1, NoopActuator).unwrap();

        assert!(!process_next(&mut control, &consumer, Duration::from_millis(5)).unwrap());
        assert_eq!(control.stats().idle_waits, 1);
    }

    #[test]
    fn test_disconnected_queue_is_an_error() {
        let (server, consumer) = relay_channels(4, Duration::from_millis(5));
        let mut control = VentControl::new(1, NoopActuator).unwrap();
        drop(server);

        assert!(matches!(
            process_next(&mut control, &consumer, Duration::from_millis(5)),
            Err(ControlError::Disconnected)
        ));
    }
}
