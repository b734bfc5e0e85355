// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! One-shot startup gate
//!
//! The multiplexer waits here until the network supervisor reports a usable
//! address. Released at most once per gate; a restart needs a fresh gate.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateInner {
    released: Mutex<bool>,
    signal: Condvar,
}

/// Cloneable handle to a shared one-shot gate
#[derive(Debug, Clone, Default)]
pub struct StartupGate {
    inner: Arc<GateInner>,
}

impl StartupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake every waiter
    ///
    /// Returns `false` if the gate was already open.
    pub fn release(&self) -> bool {
        let mut released = self.inner.released.lock();
        if *released {
            return false;
        }
        *released = true;
        self.inner.signal.notify_all();
        true
    }

    pub fn is_released(&self) -> bool {
        *self.inner.released.lock()
    }

    /// Block until released
    pub fn wait(&self) {
        let mut released = self.inner.released.lock();
        while !*released {
            self.inner.signal.wait(&mut released);
        }
    }

    /// Block until released or `timeout` elapses; returns whether the gate is open
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut released = self.inner.released.lock();
        if !*released {
            let _ = self.inner.signal.wait_for(&mut released, timeout);
        }
        *released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_release_once() {
        let gate = StartupGate::new();
        assert!(!gate.is_released());
        assert!(gate.release());
        assert!(!gate.release());
        assert!(gate.is_released());
    }

    #[test]
    fn test_wait_timeout_without_release() {
        let gate = StartupGate::new();
        assert!(!gate.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_release_wakes_waiter() {
        let gate = StartupGate::new();
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || {
                gate.wait();
                true
            })
        };

        thread::sleep(Duration::from_millis(20));
        gate.release();
        assert!(waiter.join().unwrap());
        assert!(gate.wait_timeout(Duration::from_millis(1)));
    }
}
