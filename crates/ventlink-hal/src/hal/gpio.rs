// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// GPIO abstraction for embedded platforms
pub trait GpioProvider {
    /// Platform-specific pin type (must be Copy for ease of use)
    type Pin: Copy;

    /// Platform-specific error type
    type Error: core::fmt::Debug;

    /// Configure a pin as a push-pull output
    fn configure_output(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Set pin high
    fn set_high(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Set pin low
    fn set_low(&mut self, pin: Self::Pin) -> Result<(), Self::Error>;

    /// Read pin state
    ///
    /// # Returns
    /// True if pin is high, false if low, or error
    fn is_high(&self, pin: Self::Pin) -> Result<bool, Self::Error>;

    /// Drive a pin to the given level
    fn set_level(&mut self, pin: Self::Pin, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high(pin)
        } else {
            self.set_low(pin)
        }
    }
}
