// ABOUTME: Sleep stage analyzer turning a batch of device samples into a dashboard snapshot
// ABOUTME: Reports the latest stage and movement plus batch-relative cycle position
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Sleep Stage Analyzer
//!
//! The snapshot deliberately reports the *latest* reading of a batch for
//! `stage` and `movement_level`; the dashboard plots "now", not a smoothed
//! value. `stage_counts` and `avg_movement` are whole-batch diagnostics.
//!
//! `cycle_position` is measured from the first to the last device timestamp
//! of the batch, modulo one sleep cycle. Samples without a timestamp give a
//! position of zero.

use sleephub_core::constants::sleep_cycle::CYCLE_DURATION_MS;
use sleephub_core::models::{AnalysisSnapshot, SleepSample, StageCounts};

/// Batch analyzer parameterized by cycle length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepStageAnalyzer {
    cycle_duration_ms: i64,
}

impl Default for SleepStageAnalyzer {
    fn default() -> Self {
        Self {
            cycle_duration_ms: CYCLE_DURATION_MS,
        }
    }
}

impl SleepStageAnalyzer {
    /// Analyzer with a custom cycle length; non-positive lengths fall back to 90 minutes
    #[must_use]
    pub const fn with_cycle_duration_ms(cycle_duration_ms: i64) -> Self {
        Self {
            cycle_duration_ms: if cycle_duration_ms > 0 {
                cycle_duration_ms
            } else {
                CYCLE_DURATION_MS
            },
        }
    }

    /// Summarize a batch of samples
    ///
    /// An empty batch yields the zeroed snapshot (awake, no movement, no
    /// counts). This is a defined result, not an error.
    #[must_use]
    pub fn analyze(&self, samples: &[SleepSample]) -> AnalysisSnapshot {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return AnalysisSnapshot::default();
        };

        let mut stage_counts = StageCounts::default();
        let mut total_movement = 0.0;
        for sample in samples {
            stage_counts.record(sample.stage);
            total_movement += sample.movement_score;
        }

        AnalysisSnapshot {
            stage: last.stage,
            movement_level: last.movement_score,
            cycle_position: self.cycle_position(first.timestamp, last.timestamp),
            stage_counts,
            avg_movement: total_movement / samples.len() as f64,
        }
    }

    fn cycle_position(&self, first: Option<i64>, last: Option<i64>) -> f64 {
        let (Some(first), Some(last)) = (first, last) else {
            return 0.0;
        };
        let elapsed = last.saturating_sub(first).max(0);
        (elapsed % self.cycle_duration_ms) as f64 / self.cycle_duration_ms as f64
    }
}

/// Summarize a batch with the standard 90-minute cycle
#[must_use]
pub fn analyze(samples: &[SleepSample]) -> AnalysisSnapshot {
    SleepStageAnalyzer::default().analyze(samples)
}
