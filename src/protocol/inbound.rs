// ABOUTME: Decodes device envelopes into a closed set of inbound events
// ABOUTME: Unknown kinds are logged and skipped; a frame with nothing usable is an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Inbound device messages
//!
//! One envelope can carry two independent things: a `data_type` payload
//! and a `status` transition. `decode` turns each recognised part into an
//! [`InboundEvent`], payload first.

use serde::Deserialize;
use serde_json::Value;
use sleephub_core::errors::ProtocolError;
use sleephub_core::models::SleepSample;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::registry::DeviceFlags;

/// Status transitions a device can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatusKind {
    /// Device (re)connected and announces its id
    Connected,
    /// Device began streaming samples
    MonitoringStarted,
    /// Device stopped streaming samples
    MonitoringStopped,
    /// No-movement threshold crossed
    SleepDetected,
    /// Alarm countdown on the device expired
    AlarmTriggered,
}

impl DeviceStatusKind {
    /// Wire spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::MonitoringStarted => "monitoring_started",
            Self::MonitoringStopped => "monitoring_stopped",
            Self::SleepDetected => "sleep_detected",
            Self::AlarmTriggered => "alarm_triggered",
        }
    }
}

impl FromStr for DeviceStatusKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(Self::Connected),
            "monitoring_started" => Ok(Self::MonitoringStarted),
            "monitoring_stopped" => Ok(Self::MonitoringStopped),
            "sleep_detected" => Ok(Self::SleepDetected),
            "alarm_triggered" => Ok(Self::AlarmTriggered),
            other => Err(ProtocolError::UnknownStatus {
                status: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for DeviceStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded device message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Batch of samples, in device order
    SleepData {
        /// Reporting device
        device_id: String,
        /// Decoded samples
        samples: Vec<SleepSample>,
    },
    /// Status transition
    Status {
        /// Reporting device
        device_id: String,
        /// Transition reported
        status: DeviceStatusKind,
        /// Flags carried alongside (meaningful for `connected`)
        flags: DeviceFlags,
    },
    /// `device_status` without a transition
    Heartbeat {
        /// Reporting device
        device_id: String,
    },
}

impl InboundEvent {
    /// Device the event came from
    #[must_use]
    pub fn device_id(&self) -> &str {
        match self {
            Self::SleepData { device_id, .. }
            | Self::Status { device_id, .. }
            | Self::Heartbeat { device_id } => device_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    monitoring: Option<Value>,
    #[serde(default)]
    alarm_active: Option<Value>,
}

/// Decode one text frame from a device
///
/// # Errors
///
/// Fails if the frame is not a JSON object, has no `device_id`, or carries
/// nothing the hub understands.
pub fn decode(text: &str) -> Result<Vec<InboundEvent>, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let device_id = envelope
        .device_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ProtocolError::MissingField { field: "device_id" })?;

    let mut events = Vec::with_capacity(2);
    let mut skipped = Vec::new();

    match envelope.data_type.as_deref() {
        Some("sleep_data") => events.push(InboundEvent::SleepData {
            device_id: device_id.clone(),
            samples: decode_samples(envelope.data),
        }),
        Some("device_status") | None => {}
        Some(other) => skipped.push(ProtocolError::UnknownDataType {
            data_type: other.to_owned(),
        }),
    }

    if let Some(status) = envelope.status.as_deref() {
        match status.parse::<DeviceStatusKind>() {
            Ok(status) => events.push(InboundEvent::Status {
                device_id: device_id.clone(),
                status,
                flags: DeviceFlags {
                    monitoring: truthy(envelope.monitoring.as_ref()),
                    alarm_active: truthy(envelope.alarm_active.as_ref()),
                },
            }),
            Err(e) => skipped.push(e),
        }
    }

    if events.is_empty() {
        if envelope.data_type.as_deref() == Some("device_status") && skipped.is_empty() {
            return Ok(vec![InboundEvent::Heartbeat { device_id }]);
        }
        return Err(skipped
            .pop()
            .unwrap_or(ProtocolError::MissingField { field: "data_type" }));
    }

    for error in skipped {
        warn!(device_id = %device_id, error = %error, "Ignoring part of device message");
    }
    Ok(events)
}

fn decode_samples(data: Option<Value>) -> Vec<SleepSample> {
    match data {
        Some(Value::Array(items)) => items.into_iter().map(SleepSample::from_value).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(kind = json_kind(&other), "sleep_data payload is not an array");
            Vec::new()
        }
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v.abs() > 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
