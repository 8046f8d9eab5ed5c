// ABOUTME: Main library entry point for the Sleephub sleep-sensor hub
// ABOUTME: Bridges sensor devices and observer dashboards and schedules cycle-aligned alarms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![deny(unsafe_code)]

//! # Sleephub Server
//!
//! A hub between battery-powered sleep sensors and passive dashboards.
//! Devices stream movement samples over a `WebSocket`; the hub summarizes
//! them, and when a device reports sleep onset it computes a wake-up time
//! aligned to a 90-minute sleep cycle and arms the device's alarm.
//!
//! ## Architecture
//!
//! - **Registry**: live transports, each tagged observer or device
//! - **Sample store**: one bounded session per device
//! - **Orchestrator**: the per-device state machine and the only writer
//! - **Broadcast**: fan-out of hub events to observers
//! - **Routes**: the observer-facing HTTP API and the `/ws` endpoint
//!
//! The pure analyzer and scheduler live in `sleephub-intelligence`; the
//! shared error and model types in `sleephub-core`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sleephub_server::config::ServerConfig;
//! use sleephub_server::server::HubServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     HubServer::new(config).run().await
//! }
//! ```

/// Broadcast of hub events to observers
pub mod broadcast;

/// Injectable time source
pub mod clock;

/// Environment configuration
pub mod config;

/// Structured logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Per-device state machine and observer request handling
pub mod orchestrator;

/// Wire formats for devices and observers
pub mod protocol;

/// Live transports and registered devices
pub mod registry;

/// HTTP route handlers
pub mod routes;

/// Bounded per-device sleep sessions
pub mod sample_store;

/// Server bootstrap and graceful shutdown
pub mod server;

/// `WebSocket` transport
pub mod websocket;

// Foundation crates, re-exported for binaries and tests
pub use sleephub_core::{constants, errors, models};
pub use sleephub_intelligence as intelligence;
