// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the control consumer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Invalid speed {0} (expected 0..=3)")]
    InvalidSpeed(i32),
    #[error("Actuator error: {0}")]
    Actuator(String),
    #[error("Relay queue disconnected")]
    Disconnected,
    #[error("Failed to spawn control thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ControlError>;
