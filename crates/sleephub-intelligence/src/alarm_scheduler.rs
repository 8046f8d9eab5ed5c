// ABOUTME: Alarm cycle scheduler aligning wake-up times to 90-minute sleep cycle boundaries
// ABOUTME: Returns the latest boundary after sleep onset that does not pass the target time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Alarm Cycle Scheduler
//!
//! Given the time a subject asked to be woken by and the instant sleep was
//! detected, pick the wake-up moment:
//!
//! - target at or before the reference: wake at the target, zero cycles
//! - less than one full cycle fits: wake at the target, zero cycles
//! - otherwise: the last cycle boundary (measured from the reference) that
//!   is not after the target
//!
//! The recommended time is therefore never later than the target.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sleephub_core::constants::sleep_cycle::CYCLE_DURATION_MS;

/// Result of aligning a target wake time to sleep cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmComputation {
    /// Cycle-aligned wake time, or the target when no cycle fits
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub optimal_wake_time: DateTime<Utc>,
    /// Whole cycles between the reference and the recommended time
    pub cycles_to_target: u32,
    /// Time the alarm should fire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub recommended_time: DateTime<Utc>,
}

impl AlarmComputation {
    const fn unaligned(target: DateTime<Utc>) -> Self {
        Self {
            optimal_wake_time: target,
            cycles_to_target: 0,
            recommended_time: target,
        }
    }
}

/// Scheduler parameterized by cycle length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmScheduler {
    cycle: Duration,
}

impl Default for AlarmScheduler {
    fn default() -> Self {
        Self {
            cycle: Duration::milliseconds(CYCLE_DURATION_MS),
        }
    }
}

impl AlarmScheduler {
    /// Scheduler with a custom cycle length; non-positive lengths fall back to 90 minutes
    #[must_use]
    pub fn with_cycle(cycle: Duration) -> Self {
        if cycle > Duration::zero() {
            Self { cycle }
        } else {
            Self::default()
        }
    }

    /// Cycle length in use
    #[must_use]
    pub const fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Align `target_wake_time` to cycle boundaries counted from `reference_start`
    #[must_use]
    pub fn compute(
        &self,
        target_wake_time: DateTime<Utc>,
        reference_start: DateTime<Utc>,
    ) -> AlarmComputation {
        if target_wake_time <= reference_start {
            return AlarmComputation::unaligned(target_wake_time);
        }

        let first_cycle_end = reference_start + self.cycle;
        if first_cycle_end > target_wake_time {
            return AlarmComputation::unaligned(target_wake_time);
        }

        // Both operands are non-negative here, so integer division floors.
        let remaining_ms = (target_wake_time - first_cycle_end).num_milliseconds();
        let extra_cycles = remaining_ms / self.cycle.num_milliseconds();
        let Some(optimal) = i32::try_from(extra_cycles)
            .ok()
            .and_then(|extra| self.cycle.checked_mul(extra))
            .and_then(|offset| first_cycle_end.checked_add_signed(offset))
        else {
            tracing::warn!(
                extra_cycles,
                "Cycle alignment overflowed, falling back to target wake time"
            );
            return AlarmComputation::unaligned(target_wake_time);
        };

        AlarmComputation {
            optimal_wake_time: optimal,
            cycles_to_target: u32::try_from(extra_cycles + 1).unwrap_or(u32::MAX),
            recommended_time: optimal,
        }
    }
}

/// Align a target wake time using the standard 90-minute cycle
#[must_use]
pub fn compute_alarm(
    target_wake_time: DateTime<Utc>,
    reference_start: DateTime<Utc>,
) -> AlarmComputation {
    AlarmScheduler::default().compute(target_wake_time, reference_start)
}
