// ABOUTME: Commands the hub sends to sensor and light devices
// ABOUTME: Serialized as JSON objects tagged by a "command" field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device-facing command
///
/// Field names follow the device firmware: snake case, except `maxBright`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DeviceCommand {
    /// Begin streaming samples
    StartMonitoring {
        /// Server time of the request
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// Stop streaming samples
    StopMonitoring {
        /// Server time of the request
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// Arm the on-device alarm countdown
    SetAlarm {
        /// Milliseconds from receipt until the alarm fires
        delay_ms: i64,
    },
    /// Disarm the on-device alarm
    CancelAlarm {
        /// Server time of the request
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    /// Run a wake-up dimming pattern on the bulb
    BulbDimming {
        /// Dimming curve selector
        pattern: u8,
        /// Peak brightness percentage
        #[serde(rename = "maxBright")]
        max_bright: u8,
        /// Dimming step period; device default when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval_ms: Option<u64>,
    },
    /// Switch the bulb on or off
    BulbPower {
        /// Desired power state
        on: bool,
    },
    /// Hold the dimmer at a fixed level
    SetPowerClamped {
        /// Brightness percentage
        level: u8,
    },
    /// Set the light's brightness
    SetBrightness {
        /// Brightness percentage
        level: u8,
    },
    /// Start a gradual sunrise ramp
    SunriseStart {
        /// Ramp length
        duration_ms: u64,
        /// Brightness percentage reached at the end of the ramp
        target_level: u8,
    },
    /// Abort a running sunrise ramp
    SunriseCancel,
}

impl DeviceCommand {
    /// Wire name of the command
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartMonitoring { .. } => "start_monitoring",
            Self::StopMonitoring { .. } => "stop_monitoring",
            Self::SetAlarm { .. } => "set_alarm",
            Self::CancelAlarm { .. } => "cancel_alarm",
            Self::BulbDimming { .. } => "bulb_dimming",
            Self::BulbPower { .. } => "bulb_power",
            Self::SetPowerClamped { .. } => "set_power_clamped",
            Self::SetBrightness { .. } => "set_brightness",
            Self::SunriseStart { .. } => "sunrise_start",
            Self::SunriseCancel => "sunrise_cancel",
        }
    }
}
