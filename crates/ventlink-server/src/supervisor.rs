// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network supervisor: link watch and address acquisition
//!
//! Runs beside the multiplexer. It owns the link and address providers, keeps
//! the shared [`NetworkStatus`] current and releases the [`StartupGate`] on the
//! first usable address.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use ventlink_hal::{AddressProvider, LeaseStatus, LinkProvider};

use crate::core::{Result, ServerError};
use crate::gate::StartupGate;

/// Shared "network is usable" flag read by the multiplexer
#[derive(Debug, Clone, Default)]
pub struct NetworkStatus {
    up: Arc<AtomicBool>,
}

impl NetworkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Set the flag, returning the previous value
    pub fn set_up(&self, up: bool) -> bool {
        self.up.swap(up, Ordering::AcqRel)
    }
}

/// Where the supervisor is in its bring-up cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No physical link
    LinkDown,
    /// Link up, waiting for an address
    Acquiring,
    /// Address usable
    Online,
    /// Too many failures or an address conflict; terminal
    GaveUp,
}

/// Drives link detection and address acquisition one step per tick
pub struct NetworkSupervisor<L, A> {
    link: L,
    address: A,
    gate: StartupGate,
    network: NetworkStatus,
    max_retries: u32,
    failures: u32,
    state: SupervisorState,
}

impl<L: LinkProvider, A: AddressProvider> NetworkSupervisor<L, A> {
    pub fn new(
        link: L,
        address: A,
        gate: StartupGate,
        network: NetworkStatus,
        max_retries: u32,
    ) -> Self {
        Self {
            link,
            address,
            gate,
            network,
            max_retries: max_retries.max(1),
            failures: 0,
            state: SupervisorState::LinkDown,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Consecutive acquisition failures since the last lease
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn address(&self) -> &A {
        &self.address
    }

    /// One supervision step
    pub fn tick(&mut self) -> SupervisorState {
        if self.state == SupervisorState::GaveUp {
            return self.state;
        }

        if !self.link.link_up() {
            if self.state != SupervisorState::LinkDown {
                warn!("[SUPERVISOR] Link lost, network marked down");
                self.network.set_up(false);
                self.address.stop();
                self.state = SupervisorState::LinkDown;
            }
            return self.state;
        }

        if self.state == SupervisorState::LinkDown {
            info!("[SUPERVISOR] Link up, acquiring address");
            self.address.restart();
            self.state = SupervisorState::Acquiring;
        }

        match self.address.step() {
            LeaseStatus::Leased => {
                self.failures = 0;
                if self.state != SupervisorState::Online {
                    self.state = SupervisorState::Online;
                    self.network.set_up(true);
                    if self.gate.release() {
                        info!("[SUPERVISOR] Address acquired, startup gate released");
                    } else {
                        info!("[SUPERVISOR] Address re-acquired, network back up");
                    }
                }
            }
            LeaseStatus::InProgress => {}
            LeaseStatus::Failed => self.on_failure(),
            LeaseStatus::Conflict => {
                error!("[SUPERVISOR] Address conflict detected, giving up");
                self.give_up();
            }
        }

        self.state
    }

    fn on_failure(&mut self) {
        self.failures += 1;
        if self.state == SupervisorState::Online {
            warn!("[SUPERVISOR] Lease lost, network marked down");
            self.network.set_up(false);
            self.state = SupervisorState::Acquiring;
        }

        if self.failures >= self.max_retries {
            error!(
                "[SUPERVISOR] Address acquisition failed {} times, giving up",
                self.failures
            );
            self.give_up();
        } else {
            debug!(
                "[SUPERVISOR] Address acquisition failed ({}/{}), retrying",
                self.failures, self.max_retries
            );
            self.address.restart();
        }
    }

    fn give_up(&mut self) {
        self.network.set_up(false);
        self.address.stop();
        self.state = SupervisorState::GaveUp;
    }

    /// Tick every `interval` until shutdown or until the supervisor gives up
    pub fn run(&mut self, interval: Duration, shutdown: &AtomicBool) -> SupervisorState {
        while !shutdown.load(Ordering::Relaxed) {
            if self.tick() == SupervisorState::GaveUp {
                break;
            }
            thread::sleep(interval);
        }
        self.state
    }
}

impl<L, A> NetworkSupervisor<L, A>
where
    L: LinkProvider + Send + 'static,
    A: AddressProvider + Send + 'static,
{
    /// Run on a dedicated thread
    pub fn spawn(
        mut self,
        interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Result<JoinHandle<SupervisorState>> {
        thread::Builder::new()
            .name("ventlink-supervisor".into())
            .spawn(move || self.run(interval, &shutdown))
            .map_err(|source| ServerError::Spawn {
                name: "ventlink-supervisor".into(),
                source,
            })
    }
}
