// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network bring-up collaborators
//!
//! The endpoint does not negotiate addresses or manage the PHY itself. It only
//! needs to know whether the physical link is up and whether the address client
//! currently holds a usable lease.

/// Physical link detection
pub trait LinkProvider {
    /// Returns `true` while the physical link (cable / PHY) is up
    fn link_up(&mut self) -> bool;
}

/// Outcome of one address acquisition step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseStatus {
    /// An address is leased and the interface is configured
    Leased,
    /// Negotiation is still running
    InProgress,
    /// The current attempt timed out or was refused
    Failed,
    /// The offered address is already in use on the segment
    Conflict,
}

/// Address acquisition client (DHCP or static configuration)
pub trait AddressProvider {
    /// Run one non-blocking step of the acquisition state machine
    fn step(&mut self) -> LeaseStatus;

    /// Restart acquisition from scratch (after a link comes back)
    fn restart(&mut self);

    /// Stop the client and release its socket
    fn stop(&mut self);
}
