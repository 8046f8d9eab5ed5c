// ABOUTME: Connection registry tracking live transports and the device each one speaks for
// ABOUTME: Every transport carries an explicit role tag; devices are keyed by device id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Connection Registry
//!
//! Transports join as observers. A `connected` status report promotes the
//! transport to the device role for one device id. A later report for the
//! same id from another transport takes the id over and demotes the old
//! transport back to an observer. There is no handshake; last write wins.

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sleephub_core::errors::{AppError, AppResult};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::DeviceCommand;

/// Identifier assigned to each transport when it connects
pub type ConnectionId = Uuid;

/// Outbound queue of one transport, drained by its forwarder task
pub type Outbound = mpsc::UnboundedSender<Message>;

/// What a transport is used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRole {
    /// Dashboard or any other passive client
    Observer,
    /// Transport owned by a sensor device
    Device {
        /// Device this transport speaks for
        device_id: String,
    },
}

/// Position of a device in the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePhase {
    /// Connected, not tracking sleep
    #[default]
    Connected,
    /// Streaming samples
    Monitoring,
    /// Sleep onset reported, alarm not yet armed
    SleepDetected,
    /// `set_alarm` sent to the device
    AlarmScheduled,
}

/// Initial flags reported alongside `connected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceFlags {
    /// Device is already streaming samples
    pub monitoring: bool,
    /// Device already has an alarm counting down
    pub alarm_active: bool,
}

/// A registered device
#[derive(Debug, Clone)]
pub struct Device {
    /// Stable device identifier
    pub device_id: String,
    /// Transport owning this device entry
    pub connection_id: ConnectionId,
    /// When the current transport registered the device
    pub connected_at: DateTime<Utc>,
    /// Device is streaming samples
    pub is_monitoring: bool,
    /// Device has an alarm counting down
    pub alarm_active: bool,
    /// State machine position
    pub phase: DevicePhase,
}

impl Device {
    /// Phase implied by the monitoring and alarm flags alone
    ///
    /// A pending device alarm outranks monitoring; `SleepDetected` is never
    /// a resting phase.
    #[must_use]
    pub const fn resting_phase(&self) -> DevicePhase {
        if self.alarm_active {
            DevicePhase::AlarmScheduled
        } else if self.is_monitoring {
            DevicePhase::Monitoring
        } else {
            DevicePhase::Connected
        }
    }

    /// Observer-facing view of the device
    #[must_use]
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            device_id: self.device_id.clone(),
            is_monitoring: self.is_monitoring,
            alarm_active: self.alarm_active,
            connected_at: self.connected_at,
            phase: self.phase,
        }
    }
}

/// Device entry as shown to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Device identifier
    pub device_id: String,
    /// Device is streaming samples
    pub is_monitoring: bool,
    /// Device has an alarm counting down
    pub alarm_active: bool,
    /// Registration time, epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub connected_at: DateTime<Utc>,
    /// State machine position
    pub phase: DevicePhase,
}

#[derive(Debug)]
struct Connection {
    tx: Outbound,
    role: TransportRole,
}

/// Live transports and the devices they own
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    devices: HashMap<String, Device>,
}

impl ConnectionRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted transport as an observer
    pub fn attach(&mut self, connection_id: ConnectionId, tx: Outbound) {
        self.connections.insert(
            connection_id,
            Connection {
                tx,
                role: TransportRole::Observer,
            },
        );
        debug!(connection_id = %connection_id, "Transport attached");
    }

    /// Register `device_id` on `connection_id`
    ///
    /// Returns `false` if the transport is unknown (already closed).
    pub fn register_device(
        &mut self,
        connection_id: ConnectionId,
        device_id: &str,
        flags: DeviceFlags,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(role) = self
            .connections
            .get(&connection_id)
            .map(|connection| connection.role.clone())
        else {
            warn!(connection_id = %connection_id, device_id, "Registration from unknown transport");
            return false;
        };

        // One transport, one device id
        if let TransportRole::Device {
            device_id: previous,
        } = role
        {
            if previous != device_id {
                self.devices.remove(&previous);
                info!(
                    connection_id = %connection_id,
                    previous_device_id = %previous,
                    device_id,
                    "Transport switched device id"
                );
            }
        }

        if let Some(displaced) = self.devices.get(device_id) {
            if displaced.connection_id != connection_id {
                let displaced_connection = displaced.connection_id;
                if let Some(connection) = self.connections.get_mut(&displaced_connection) {
                    connection.role = TransportRole::Observer;
                }
                info!(
                    device_id,
                    old_connection_id = %displaced_connection,
                    new_connection_id = %connection_id,
                    "Device reconnected on a new transport"
                );
            }
        }

        let mut device = Device {
            device_id: device_id.to_owned(),
            connection_id,
            connected_at: now,
            is_monitoring: flags.monitoring,
            alarm_active: flags.alarm_active,
            phase: DevicePhase::Connected,
        };
        device.phase = device.resting_phase();
        self.devices.insert(device_id.to_owned(), device);
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.role = TransportRole::Device {
                device_id: device_id.to_owned(),
            };
        }
        true
    }

    /// Forget a closed transport, returning the device it owned (if any)
    pub fn detach(&mut self, connection_id: ConnectionId) -> Option<Device> {
        let connection = self.connections.remove(&connection_id)?;
        let TransportRole::Device { device_id } = connection.role else {
            debug!(connection_id = %connection_id, "Observer detached");
            return None;
        };

        match self.devices.get(&device_id) {
            Some(device) if device.connection_id == connection_id => {
                info!(device_id = %device_id, connection_id = %connection_id, "Device disconnected");
                self.devices.remove(&device_id)
            }
            _ => None,
        }
    }

    /// Device registered under `device_id`
    #[must_use]
    pub fn lookup(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    /// Mutable access to a registered device
    pub fn lookup_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.get_mut(device_id)
    }

    /// Role of a transport, `None` if it is not attached
    #[must_use]
    pub fn role(&self, connection_id: ConnectionId) -> Option<&TransportRole> {
        self.connections
            .get(&connection_id)
            .map(|connection| &connection.role)
    }

    /// True iff the transport is attached and owns no device
    #[must_use]
    pub fn is_observer(&self, connection_id: ConnectionId) -> bool {
        matches!(self.role(connection_id), Some(TransportRole::Observer))
    }

    /// Outbound queues of every observer transport
    pub fn observers(&self) -> impl Iterator<Item = (ConnectionId, &Outbound)> + '_ {
        self.connections
            .iter()
            .filter(|(_, connection)| connection.role == TransportRole::Observer)
            .map(|(id, connection)| (*id, &connection.tx))
    }

    /// Whether the device exists and its transport can still accept frames
    #[must_use]
    pub fn is_device_open(&self, device_id: &str) -> bool {
        self.device_outbound(device_id).is_some()
    }

    fn device_outbound(&self, device_id: &str) -> Option<&Outbound> {
        let device = self.devices.get(device_id)?;
        self.connections
            .get(&device.connection_id)
            .map(|connection| &connection.tx)
            .filter(|tx| !tx.is_closed())
    }

    /// Send a command to a device's transport
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown device, `DeviceUnavailable` if its
    /// transport is closed, `SerializationError` if the command cannot be
    /// encoded.
    pub fn send_to_device(&self, device_id: &str, command: &DeviceCommand) -> AppResult<()> {
        if !self.devices.contains_key(device_id) {
            return Err(AppError::not_found(format!("Device {device_id}")));
        }
        let tx = self
            .device_outbound(device_id)
            .ok_or_else(|| AppError::device_unavailable(device_id))?;

        let payload = serde_json::to_string(command)?;
        tx.send(Message::Text(payload)).map_err(|e| {
            warn!(device_id, error = %e, "Device transport rejected command");
            AppError::device_unavailable(device_id)
        })?;
        debug!(device_id, command = command.name(), "Command sent to device");
        Ok(())
    }

    /// Summaries of every registered device, ordered by id
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceSummary> {
        let mut devices: Vec<_> = self.devices.values().map(Device::summary).collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    /// Number of attached transports
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of registered devices
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
