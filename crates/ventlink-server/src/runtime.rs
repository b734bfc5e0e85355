// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Threaded multiplexer runtime

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};
use ventlink_hal::{SocketProvider, TimeProvider};

use crate::core::{Result, ServerError};
use crate::gate::StartupGate;
use crate::pool::SessionPool;
use crate::supervisor::NetworkStatus;

const THREAD_NAME: &str = "ventlink-mux";

/// Runs a [`SessionPool`] on its own thread
///
/// The thread waits on the startup gate, then polls until the shared shutdown
/// flag is set. Dropping the runtime sets the flag and joins the thread.
pub struct ServerRuntime<S, T> {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<SessionPool<S, T>>>,
}

impl<S, T> ServerRuntime<S, T>
where
    S: SocketProvider + Send + 'static,
    T: TimeProvider + Send + 'static,
{
    pub fn spawn(
        mut pool: SessionPool<S, T>,
        gate: StartupGate,
        network: NetworkStatus,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                pool.run(&gate, &network, &flag);
                pool
            })
            .map_err(|source| ServerError::Spawn {
                name: THREAD_NAME.into(),
                source,
            })?;

        info!("[SERVER] Multiplexer thread started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl<S, T> ServerRuntime<S, T> {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal shutdown, join, and hand the pool back for inspection
    pub fn stop(mut self) -> Option<SessionPool<S, T>> {
        self.join()
    }

    fn join(&mut self) -> Option<SessionPool<S, T>> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(pool) => Some(pool),
            Err(_) => {
                error!("[SERVER] Multiplexer thread panicked");
                None
            }
        }
    }
}

impl<S, T> Drop for ServerRuntime<S, T> {
    fn drop(&mut self) {
        let _ = self.join();
    }
}
