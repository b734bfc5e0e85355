// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # ventlink HAL
//!
//! Platform abstraction for the ventlink control endpoint.
//!
//! This crate provides:
//! - **HAL traits** (`hal` module) - the primitive operations the session
//!   multiplexer and the controller are allowed to call
//! - **Platform implementations** (`platforms` module) - a host platform built on
//!   `std::net` and a scripted platform for tests
//!
//! The traits themselves are `no_std`; a firmware port only has to implement
//! [`SocketProvider`], [`TimeProvider`], [`GpioProvider`], [`LinkProvider`] and
//! [`AddressProvider`] for its network chip and board.
//!
//! ## Feature Flags
//! - `std` (default) - host platform (`HostClock`, `TcpSocketProvider`, `HostGpio`, ...)
//! - `mock` - scripted platform (`MockClock`, `MockSocketProvider`, ...)

/// Hardware abstraction traits shared by all platforms.
pub mod hal;

/// Concrete platform implementations.
pub mod platforms;

pub use hal::{
    AddressProvider, GpioProvider, LeaseStatus, LinkProvider, SocketId, SocketProvider,
    SocketStatus, TimeProvider, Transfer,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
