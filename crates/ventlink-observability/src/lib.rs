// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ventlink-observability
//!
//! Logging setup shared by every ventlink binary, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: daily-rolling JSON log files next to the console output

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known ventlink crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "ventlink-hal",
    "ventlink-server",
    "ventlink-control",
    "ventlink-config",
    "ventlink-daemon",
];
