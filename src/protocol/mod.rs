// ABOUTME: Wire protocol spoken between the hub and its sensor devices and dashboards
// ABOUTME: Device envelopes and commands in one direction, observer events in the other
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! # Wire protocol
//!
//! All frames are JSON text. Devices send envelopes keyed by `device_id`
//! and `data_type`, optionally carrying a `status` transition; the hub
//! replies with `{command: ...}` objects. Observers only ever receive
//! `{type: ...}` events. Every instant on the wire is epoch milliseconds.

/// Commands sent to devices
pub mod commands;
/// Events broadcast to observers
pub mod events;
/// Decoding of device envelopes
pub mod inbound;

pub use commands::DeviceCommand;
pub use events::{HubEvent, SleepInfo};
pub use inbound::{decode, DeviceStatusKind, InboundEvent};
