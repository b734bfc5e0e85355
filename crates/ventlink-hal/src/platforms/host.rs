// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host platform implementation
//!
//! Clock, GPIO latch and network bring-up collaborators for running the
//! endpoint on a regular operating system. Sockets live in [`super::tcp`].

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use crate::hal::{AddressProvider, GpioProvider, LeaseStatus, LinkProvider, TimeProvider};

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    /// Start a clock at zero
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for HostClock {
    fn get_time_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    fn delay_us(&self, us: u32) {
        thread::sleep(Duration::from_micros(u64::from(us)));
    }
}

/// In-memory GPIO latch
///
/// Hosts have no relay header; the latch records the level each pin was last
/// driven to so the controller behaves exactly as on the board.
#[derive(Debug, Default, Clone)]
pub struct HostGpio {
    levels: HashMap<u8, bool>,
}

/// Host GPIO errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HostGpioError {
    /// Pin was never configured as an output
    #[error("pin {0} is not configured as an output")]
    NotConfigured(u8),
}

impl HostGpio {
    /// Create an empty latch
    pub fn new() -> Self {
        Self::default()
    }
}

impl GpioProvider for HostGpio {
    type Pin = u8;
    type Error = HostGpioError;

    fn configure_output(&mut self, pin: u8) -> Result<(), HostGpioError> {
        self.levels.entry(pin).or_insert(false);
        Ok(())
    }

    fn set_high(&mut self, pin: u8) -> Result<(), HostGpioError> {
        let level = self
            .levels
            .get_mut(&pin)
            .ok_or(HostGpioError::NotConfigured(pin))?;
        *level = true;
        Ok(())
    }

    fn set_low(&mut self, pin: u8) -> Result<(), HostGpioError> {
        let level = self
            .levels
            .get_mut(&pin)
            .ok_or(HostGpioError::NotConfigured(pin))?;
        *level = false;
        Ok(())
    }

    fn is_high(&self, pin: u8) -> Result<bool, HostGpioError> {
        self.levels
            .get(&pin)
            .copied()
            .ok_or(HostGpioError::NotConfigured(pin))
    }
}

/// Link provider for hosts: the operating system owns the interface
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLink;

impl LinkProvider for HostLink {
    fn link_up(&mut self) -> bool {
        true
    }
}

/// Address provider for statically configured interfaces
///
/// Reports a lease on the first step; there is nothing to negotiate.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAddress {
    stopped: bool,
}

impl AddressProvider for StaticAddress {
    fn step(&mut self) -> LeaseStatus {
        if self.stopped {
            LeaseStatus::InProgress
        } else {
            LeaseStatus::Leased
        }
    }

    fn restart(&mut self) {
        self.stopped = false;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_clock_is_monotonic() {
        let clock = HostClock::new();
        let first = clock.get_time_us();
        clock.delay_us(200);
        assert!(clock.get_time_us() >= first + 200);
    }

    #[test]
    fn test_host_gpio_requires_configuration() {
        let mut gpio = HostGpio::new();
        assert_eq!(gpio.set_high(28), Err(HostGpioError::NotConfigured(28)));

        gpio.configure_output(28).unwrap();
        assert_eq!(gpio.is_high(28), Ok(false));
        gpio.set_level(28, true).unwrap();
        assert_eq!(gpio.is_high(28), Ok(true));
    }

    #[test]
    fn test_static_address_leases_until_stopped() {
        let mut address = StaticAddress::default();
        assert_eq!(address.step(), LeaseStatus::Leased);
        address.stop();
        assert_eq!(address.step(), LeaseStatus::InProgress);
        address.restart();
        assert_eq!(address.step(), LeaseStatus::Leased);
    }
}
