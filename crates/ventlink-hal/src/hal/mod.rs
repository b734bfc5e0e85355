// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// General-purpose I/O abstractions for pins.
pub mod gpio;
/// Physical link and address acquisition collaborators.
pub mod link;
/// Connection-oriented socket primitives.
pub mod socket;
/// Timekeeping abstractions (monotonic timers, delays).
pub mod time;

pub use gpio::GpioProvider;
pub use link::{AddressProvider, LeaseStatus, LinkProvider};
pub use socket::{SocketId, SocketProvider, SocketStatus, Transfer};
pub use time::TimeProvider;
