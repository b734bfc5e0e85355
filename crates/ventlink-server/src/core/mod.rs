// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core types shared by every server module

pub mod config;
pub mod types;

pub use config::ServerConfig;
pub use types::{Message, MessageType, Result, ServerError, SessionId};
