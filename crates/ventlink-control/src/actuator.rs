// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Speed actuators

use ventlink_hal::GpioProvider;

use crate::error::{ControlError, Result};

/// Something that physically applies a fan speed
pub trait SpeedActuator {
    fn apply(&mut self, speed: u8) -> Result<()>;
}

/// Single-relay board: the relay is energized only at speed 1
pub struct RelayActuator<G: GpioProvider> {
    gpio: G,
    pin: G::Pin,
}

impl<G: GpioProvider> RelayActuator<G> {
    /// Configure `pin` as an output and start with the relay released
    pub fn new(mut gpio: G, pin: G::Pin) -> Result<Self> {
        gpio.configure_output(pin)
            .map_err(|e| ControlError::Actuator(format!("{:?}", e)))?;
        gpio.set_low(pin)
            .map_err(|e| ControlError::Actuator(format!("{:?}", e)))?;
        Ok(Self { gpio, pin })
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn is_energized(&self) -> Result<bool> {
        self.gpio
            .is_high(self.pin)
            .map_err(|e| ControlError::Actuator(format!("{:?}", e)))
    }
}

impl<G: GpioProvider> SpeedActuator for RelayActuator<G> {
    fn apply(&mut self, speed: u8) -> Result<()> {
        self.gpio
            .set_level(self.pin, speed == 1)
            .map_err(|e| ControlError::Actuator(format!("{:?}", e)))
    }
}

/// For hosts without relay hardware
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActuator;

impl SpeedActuator for NoopActuator {
    fn apply(&mut self, _speed: u8) -> Result<()> {
        Ok(())
    }
}
