// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ventlink control consumer
//!
//! Consumes parsed client commands from the inbound relay queue, keeps the
//! current fan speed, drives the relay and answers every command with the
//! current speed on the outbound queue.

pub mod actuator;
pub mod controller;
pub mod error;
pub mod worker;

pub use actuator::{NoopActuator, RelayActuator, SpeedActuator};
pub use controller::{ControlStats, VentControl, MAX_SPEED};
pub use error::{ControlError, Result};
pub use worker::{process_next, ControlWorker};
