// ABOUTME: Sleep intelligence algorithms for the Sleephub hub
// ABOUTME: Batch analysis of device samples and 90-minute cycle alarm alignment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![deny(unsafe_code)]

//! # Sleephub Intelligence
//!
//! Side-effect free algorithms used by the session orchestrator:
//!
//! - **analyzer**: summarizes a batch of [`SleepSample`](sleephub_core::models::SleepSample)s
//!   into an [`AnalysisSnapshot`](sleephub_core::models::AnalysisSnapshot)
//! - **alarm_scheduler**: picks the latest sleep-cycle boundary that does not
//!   exceed the requested wake time

/// Sleep stage analyzer
pub mod analyzer;

/// Alarm cycle scheduler
pub mod alarm_scheduler;

pub use alarm_scheduler::{compute_alarm, AlarmComputation, AlarmScheduler};
pub use analyzer::{analyze, SleepStageAnalyzer};
