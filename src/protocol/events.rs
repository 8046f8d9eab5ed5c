// ABOUTME: Events broadcast to observer dashboards
// ABOUTME: Serialized as JSON objects tagged by a "type" field with camelCase payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use chrono::{DateTime, Utc};
use serde::Serialize;
use sleephub_core::models::AnalysisSnapshot;

use crate::registry::DeviceSummary;

/// Observer-facing event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum HubEvent {
    /// Full device list after any registration change
    DeviceStatus {
        /// Every registered device
        devices: Vec<DeviceSummary>,
    },
    /// Analysis of a freshly received sample batch
    SleepData {
        /// Reporting device
        device_id: String,
        /// Snapshot of the batch
        analysis: AnalysisSnapshot,
        /// Server receive time
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// Sleep onset and the alarm time derived from it
    SleepDetected {
        /// Reporting device
        device_id: String,
        /// Alarm computation result
        sleep_info: SleepInfo,
        /// Server receive time
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// The device's alarm fired
    AlarmTriggered {
        /// Reporting device
        device_id: String,
        /// Server receive time
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
}

impl HubEvent {
    /// Wire name of the event
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DeviceStatus { .. } => "device_status",
            Self::SleepData { .. } => "sleep_data",
            Self::SleepDetected { .. } => "sleep_detected",
            Self::AlarmTriggered { .. } => "alarm_triggered",
        }
    }
}

/// Payload of [`HubEvent::SleepDetected`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepInfo {
    /// Reference instant the cycles are counted from
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub sleep_start_time: DateTime<Utc>,
    /// When the device was told to fire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub recommended_alarm_time: DateTime<Utc>,
    /// Whole cycles fitting before the recommended time
    pub cycles_to_target: u32,
}
