// ABOUTME: Broadcast dispatcher fanning hub events out to every observer transport
// ABOUTME: Serializes once, never writes to device transports, never retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::extract::ws::Message;
use tracing::{trace, warn};

use crate::protocol::HubEvent;
use crate::registry::ConnectionRegistry;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// Observers whose queue accepted the frame
    pub delivered: usize,
    /// Observers whose transport had already closed
    pub failed: usize,
}

/// Fire-and-forget fan-out to observers
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastDispatcher;

impl BroadcastDispatcher {
    /// Push `event` to every observer in `registry`
    ///
    /// A closed observer is skipped and counted; it never prevents delivery
    /// to the others.
    pub fn broadcast(registry: &ConnectionRegistry, event: &HubEvent) -> DeliveryReport {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event = event.kind(), error = %e, "Failed to serialize broadcast event");
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport::default();
        for (connection_id, tx) in registry.observers() {
            if let Err(e) = tx.send(Message::Text(payload.clone())) {
                report.failed += 1;
                warn!(
                    connection_id = %connection_id,
                    event = event.kind(),
                    error = ?e,
                    "Failed to deliver event to observer"
                );
            } else {
                report.delivered += 1;
            }
        }

        trace!(
            event = event.kind(),
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast complete"
        );
        report
    }
}
