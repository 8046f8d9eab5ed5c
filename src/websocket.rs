// ABOUTME: WebSocket transport shared by sensor devices and observer dashboards
// ABOUTME: Splits each socket into a forwarder task and a read loop feeding the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! `WebSocket` transport
//!
//! Every socket gets a [`ConnectionId`] and an unbounded outbound queue
//! drained by its own forwarder task, so the orchestrator never waits on a
//! slow peer. Inbound text frames go to the orchestrator; a frame that does
//! not decode is logged and dropped, never closing the socket.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use sleephub_core::errors::ProtocolError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::orchestrator::SessionOrchestrator;
use crate::registry::ConnectionId;

/// Handles upgraded sockets on behalf of the orchestrator
#[derive(Clone)]
pub struct HubWebSocket {
    orchestrator: Arc<SessionOrchestrator>,
}

impl HubWebSocket {
    /// Transport bound to `orchestrator`
    #[must_use]
    pub const fn new(orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Serve one socket until it closes
    pub async fn handle_connection(&self, ws: WebSocket) {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();

        // Forward queued frames to the socket
        let ws_send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if ws_tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        self.orchestrator.attach(connection_id, tx).await;
        info!(connection_id = %connection_id, "WebSocket connection opened");

        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => self.handle_text(connection_id, &text).await,
                Ok(Message::Binary(bytes)) => {
                    let error = ProtocolError::UnsupportedFrame { kind: "binary" };
                    warn!(
                        connection_id = %connection_id,
                        len = bytes.len(),
                        error = %error,
                        "Dropping frame"
                    );
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!(connection_id = %connection_id, error = %e, "WebSocket read failed");
                    break;
                }
                // Ping/pong are answered by the protocol layer
                Ok(_) => {}
            }
        }

        ws_send_task.abort();
        self.orchestrator.detach(connection_id).await;
        info!(connection_id = %connection_id, "WebSocket connection closed");
    }

    async fn handle_text(&self, connection_id: ConnectionId, text: &str) {
        match self.orchestrator.handle_frame(connection_id, text).await {
            Ok(outcomes) => {
                debug!(connection_id = %connection_id, events = outcomes.len(), "Frame applied");
            }
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    frame_len = text.len(),
                    "Dropping malformed frame"
                );
            }
        }
    }
}
