// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Platform implementations
//!
//! Each platform module implements the HAL traits defined in `crate::hal`.
//!
//! Available platforms:
//! - Host (`std`): desktop / single-board computers using `std::net`
//! - Mock (`mock`): scripted sockets and a manual clock for tests

#[cfg(feature = "std")]
pub mod host;

#[cfg(feature = "std")]
pub mod tcp;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "std")]
pub use host::{HostClock, HostGpio, HostGpioError, HostLink, StaticAddress};

#[cfg(feature = "std")]
pub use tcp::{TcpSocketError, TcpSocketProvider};

#[cfg(feature = "mock")]
pub use mock::{MockClock, MockLink, MockSocketError, MockSocketProvider, ScriptedAddress};
