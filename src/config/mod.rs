// ABOUTME: Configuration module for the hub's listen address and orchestrator tunables
// ABOUTME: Re-exports the environment-driven ServerConfig and AlarmConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Configuration module for the Sleephub server
//!
//! - **Environment**: network, environment and log level from env vars
//! - **Alarm**: dimming defaults and floors, session retention

/// Environment and server configuration
pub mod environment;

pub use environment::{AlarmConfig, Environment, LogLevel, ServerConfig};
