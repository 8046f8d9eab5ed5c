// ABOUTME: Alarm settings per device and normalization of observer alarm requests
// ABOUTME: Parses wake times in several formats and applies dimming defaults and floors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Alarm settings
//!
//! Dashboards send loosely typed values: numbers as strings, dates in more
//! than one shape. Everything is normalized here, once, before a setting is
//! stored. Only the wake time and device id can reject a request; every
//! dimming parameter falls back to its configured default.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sleephub_core::constants::alarm::MAX_BRIGHTNESS;
use sleephub_core::errors::{AppError, AppResult};
use sleephub_intelligence::AlarmComputation;
use std::fmt;

use crate::config::AlarmConfig;

const WAKE_TIME_FIELD: &str = "targetWakeTime";
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Stored alarm of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSetting {
    /// Latest acceptable wake time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub target_wake_time: DateTime<Utc>,
    /// Dimming curve selector
    pub pattern: u8,
    /// Peak brightness percentage
    pub max_bright: u8,
    /// Dimming step period
    pub interval_ms: u64,
    /// When the setting was stored
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub set_at: DateTime<Utc>,
    /// Sleep onset has been reported since the setting was stored
    pub sleep_detected: bool,
    /// Reference instant of the alarm computation
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub sleep_start_time: Option<DateTime<Utc>>,
    /// Cycle-aligned wake time
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub optimal_wake_time: Option<DateTime<Utc>>,
    /// Time the device was told to fire
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub recommended_time: Option<DateTime<Utc>>,
    /// Whole cycles before the recommended time
    pub cycles_to_target: Option<u32>,
    /// When the detection was processed
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub sleep_detected_at: Option<DateTime<Utc>>,
}

impl AlarmSetting {
    /// Fresh setting with no detection results
    #[must_use]
    pub const fn new(
        target_wake_time: DateTime<Utc>,
        dimming: DimmingParams,
        set_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target_wake_time,
            pattern: dimming.pattern,
            max_bright: dimming.max_bright,
            interval_ms: dimming.interval_ms,
            set_at,
            sleep_detected: false,
            sleep_start_time: None,
            optimal_wake_time: None,
            recommended_time: None,
            cycles_to_target: None,
            sleep_detected_at: None,
        }
    }

    /// Fill in the results of a sleep detection
    pub fn record_detection(
        &mut self,
        sleep_start_time: DateTime<Utc>,
        computation: &AlarmComputation,
        detected_at: DateTime<Utc>,
    ) {
        self.sleep_detected = true;
        self.sleep_start_time = Some(sleep_start_time);
        self.optimal_wake_time = Some(computation.optimal_wake_time);
        self.recommended_time = Some(computation.recommended_time);
        self.cycles_to_target = Some(computation.cycles_to_target);
        self.sleep_detected_at = Some(detected_at);
    }
}

/// Normalized dimming parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimmingParams {
    /// Dimming curve selector, at least 1
    pub pattern: u8,
    /// Peak brightness percentage, 0..=100
    pub max_bright: u8,
    /// Dimming step period, at or above the configured floor
    pub interval_ms: u64,
}

impl DimmingParams {
    /// Normalize raw request values against `config`
    ///
    /// - `pattern`: integer prefix; absent, unparseable, or outside 1..=255 gives the default
    /// - `max_bright`: integer prefix clamped to 0..=100; absent or unparseable gives the default
    /// - `interval_ms`: integer prefix; absent, unparseable, or below the floor gives the default
    #[must_use]
    pub fn normalize(
        pattern: Option<&Value>,
        max_bright: Option<&Value>,
        interval_ms: Option<&Value>,
        config: &AlarmConfig,
    ) -> Self {
        let pattern = pattern
            .and_then(leading_integer)
            .and_then(|p| u8::try_from(p).ok())
            .filter(|p| *p > 0)
            .unwrap_or(config.default_pattern);
        let max_bright = max_bright
            .and_then(leading_integer)
            .map_or(config.default_max_bright, clamp_percentage);
        let interval_ms = interval_ms
            .and_then(leading_integer)
            .and_then(|ms| u64::try_from(ms).ok())
            .filter(|ms| *ms >= config.min_interval_ms)
            .unwrap_or(config.default_interval_ms);

        Self {
            pattern,
            max_bright,
            interval_ms,
        }
    }
}

/// Observer request to arm an alarm
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAlarmRequest {
    /// Target device
    #[serde(default, deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
    /// Wake time as epoch ms, numeric string, RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` (UTC)
    #[serde(default)]
    pub target_wake_time: Option<Value>,
    /// Dimming curve selector
    #[serde(default)]
    pub pattern: Option<Value>,
    /// Peak brightness percentage
    #[serde(default)]
    pub max_bright: Option<Value>,
    /// Dimming step period
    #[serde(default)]
    pub interval_ms: Option<Value>,
}

/// Normalized echo of an accepted alarm request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSetResponse {
    /// Target device
    pub device_id: String,
    /// Parsed wake time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub target_wake_time: DateTime<Utc>,
    /// Dimming curve selector in effect
    pub pattern: u8,
    /// Peak brightness in effect
    pub max_bright: u8,
    /// Dimming step period in effect
    pub interval_ms: u64,
    /// Whether `start_monitoring` reached the device
    pub monitoring_requested: bool,
}

/// Require a non-empty device id
///
/// # Errors
///
/// `MissingRequiredField` when absent or blank
pub fn require_device_id(device_id: Option<&str>) -> AppResult<&str> {
    device_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::missing_field("deviceId"))
}

/// Accept a device id given as a string or a bare number
///
/// Dashboards key devices by whatever the firmware reported, which is
/// sometimes numeric. `null` reads as absent.
///
/// # Errors
///
/// Any other JSON type.
pub fn deserialize_device_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "deviceId must be a string or number, got {other}"
        ))),
    }
}

/// Parse a wake time
///
/// # Errors
///
/// `MissingRequiredField` for absent or empty values, `InvalidFormat` for
/// anything that is not a representable instant.
pub fn parse_wake_time(value: Option<&Value>) -> AppResult<DateTime<Utc>> {
    match value {
        None | Some(Value::Null) => Err(AppError::missing_field(WAKE_TIME_FIELD)),
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            Err(AppError::missing_field(WAKE_TIME_FIELD))
        }
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| invalid_wake_time(number)),
        Some(Value::String(raw)) => {
            parse_wake_time_str(raw.trim()).ok_or_else(|| invalid_wake_time(raw))
        }
        Some(other) => Err(invalid_wake_time(other)),
    }
}

fn invalid_wake_time(raw: impl fmt::Display) -> AppError {
    AppError::invalid_format(WAKE_TIME_FIELD, format!("unrecognized date '{raw}'"))
}

fn parse_wake_time_str(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Integer value of a loosely typed field
///
/// Numbers are truncated toward zero; strings contribute their leading
/// integer (`"12px"` is 12, `"px"` is nothing).
#[must_use]
pub fn leading_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(raw) => {
            let trimmed = raw.trim_start();
            let (sign, digits) = match trimmed.as_bytes().first() {
                Some(b'-') => (-1, &trimmed[1..]),
                Some(b'+') => (1, &trimmed[1..]),
                _ => (1, trimmed),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

/// Clamp an integer to a brightness percentage
#[must_use]
pub fn clamp_percentage(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_BRIGHTNESS)) as u8
}
