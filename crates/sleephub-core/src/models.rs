// ABOUTME: Sleep domain models for device samples and their analysis
// ABOUTME: Sample decoding is lenient so one bad field never rejects a whole batch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sleep stage reported by a device
///
/// Travels on the wire as its numeric code (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum SleepStage {
    /// Subject is awake (code 0)
    #[default]
    Awake,
    /// Light sleep (code 1)
    Light,
    /// Deep sleep (code 2)
    Deep,
}

impl SleepStage {
    /// Numeric wire code
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Awake => 0,
            Self::Light => 1,
            Self::Deep => 2,
        }
    }

    /// Decode a wire code; codes outside 0..=2 are `None`
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Awake),
            1 => Some(Self::Light),
            2 => Some(Self::Deep),
            _ => None,
        }
    }

    /// Decode an arbitrary JSON value, falling back to `Awake`
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        value
            .as_f64()
            .filter(|code| code.fract().abs() < f64::EPSILON && (0.0..=2.0).contains(code))
            .and_then(|code| Self::from_code(code as u8))
            .unwrap_or_default()
    }
}

impl From<SleepStage> for u8 {
    fn from(stage: SleepStage) -> Self {
        stage.code()
    }
}

impl From<u8> for SleepStage {
    fn from(code: u8) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

/// One movement/sleep reading from a device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepSample {
    /// Stage classified on the device
    #[serde(rename = "sleep_stage", default, deserialize_with = "lenient_stage")]
    pub stage: SleepStage,
    /// Movement score, nominally in [0, 1] but never clamped
    #[serde(default, deserialize_with = "lenient_score")]
    pub movement_score: f64,
    /// Device clock reading in milliseconds; not comparable across devices
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

impl SleepSample {
    /// Build a sample with a device timestamp
    #[must_use]
    pub const fn new(stage: SleepStage, movement_score: f64, timestamp: Option<i64>) -> Self {
        Self {
            stage,
            movement_score,
            timestamp,
        }
    }

    /// Decode one element of a device `data` array
    ///
    /// Anything that is not an object decodes to the default sample.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

fn lenient_stage<'de, D>(deserializer: D) -> Result<SleepStage, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(SleepStage::from_value(&value))
}

fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)))
}

/// Per-stage sample counts of an analyzed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageCounts {
    /// Samples classified awake
    pub awake: usize,
    /// Samples classified light sleep
    pub light: usize,
    /// Samples classified deep sleep
    pub deep: usize,
}

impl StageCounts {
    /// Count one more sample of `stage`
    pub fn record(&mut self, stage: SleepStage) {
        match stage {
            SleepStage::Awake => self.awake += 1,
            SleepStage::Light => self.light += 1,
            SleepStage::Deep => self.deep += 1,
        }
    }

    /// Total samples counted
    #[must_use]
    pub const fn total(&self) -> usize {
        self.awake + self.light + self.deep
    }
}

/// Summary of one batch of samples, as shown on the dashboard
///
/// `stage` and `movement_level` are the latest readings of the batch, the
/// remaining fields are whole-batch aggregates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    /// Stage of the last sample
    #[serde(rename = "sleepStage")]
    pub stage: SleepStage,
    /// Movement score of the last sample
    pub movement_level: f64,
    /// Fractional progress through the current cycle, in [0, 1)
    pub cycle_position: f64,
    /// Stage histogram of the batch
    pub stage_counts: StageCounts,
    /// Mean movement score of the batch
    pub avg_movement: f64,
}
