// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

/// Time and delay abstraction for embedded platforms
pub trait TimeProvider {
    /// Get current time in microseconds since system boot
    ///
    /// # Returns
    /// Monotonic timestamp in microseconds
    fn get_time_us(&self) -> u64;

    /// Block for the specified number of microseconds
    fn delay_us(&self, us: u32);

    /// Block for the specified number of milliseconds
    fn delay_ms(&self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Time elapsed since an earlier timestamp taken from this provider
    fn elapsed_since(&self, earlier_us: u64) -> Duration {
        Duration::from_micros(self.get_time_us().saturating_sub(earlier_us))
    }
}
