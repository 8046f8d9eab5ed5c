// ABOUTME: Per-device sleep sessions holding a bounded window of the most recent samples
// ABOUTME: Sessions are replaced on monitoring start and created lazily on first data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use chrono::{DateTime, Utc};
use serde::Serialize;
use sleephub_core::models::{AnalysisSnapshot, SleepSample};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// One monitoring session of one device
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSession {
    /// Owning device
    pub device_id: String,
    /// Server time the session started, epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    /// Retained samples in arrival order
    pub samples: VecDeque<SleepSample>,
    /// Samples accepted since the session started, including trimmed ones
    pub total_received: u64,
    /// Snapshot of the most recent batch
    pub last_analysis: Option<AnalysisSnapshot>,
}

impl SleepSession {
    fn new(device_id: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.to_owned(),
            start_time,
            samples: VecDeque::new(),
            total_received: 0,
            last_analysis: None,
        }
    }
}

/// Sessions keyed by device id, at most one per device
#[derive(Debug)]
pub struct SleepSampleStore {
    capacity: usize,
    sessions: HashMap<String, SleepSession>,
}

impl SleepSampleStore {
    /// Store retaining at most `capacity` samples per session
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: HashMap::new(),
        }
    }

    /// Start a fresh session, discarding any previous one for the device
    pub fn start_session(&mut self, device_id: &str, now: DateTime<Utc>) -> &SleepSession {
        let fresh = SleepSession::new(device_id, now);
        match self.sessions.entry(device_id.to_owned()) {
            Entry::Occupied(mut slot) => {
                let previous = slot.insert(fresh);
                debug!(
                    device_id,
                    dropped_samples = previous.samples.len(),
                    "Replaced previous sleep session"
                );
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(fresh),
        }
    }

    /// Append a batch in order, creating the session if monitoring began implicitly
    pub fn append_samples(
        &mut self,
        device_id: &str,
        samples: &[SleepSample],
        now: DateTime<Utc>,
    ) -> &mut SleepSession {
        let capacity = self.capacity;
        let session = self
            .sessions
            .entry(device_id.to_owned())
            .or_insert_with(|| {
                debug!(device_id, "Session created on first sleep data");
                SleepSession::new(device_id, now)
            });

        session.samples.extend(samples.iter().cloned());
        session.total_received += samples.len() as u64;
        let overflow = session.samples.len().saturating_sub(capacity);
        if overflow > 0 {
            session.samples.drain(..overflow);
        }
        session
    }

    /// Session of a device
    #[must_use]
    pub fn get(&self, device_id: &str) -> Option<&SleepSession> {
        self.sessions.get(device_id)
    }

    /// Number of sessions held
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Retention window per session
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
