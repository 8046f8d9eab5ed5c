// ABOUTME: WebSocket route handler upgrading /ws for devices and observers alike
// ABOUTME: Delegates every upgraded socket to the hub transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::debug;

use super::SharedOrchestrator;
use crate::websocket::HubWebSocket;

/// WebSocket routes implementation
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Create the `WebSocket` route
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/ws", get(Self::handle_websocket))
            .with_state(HubWebSocket::new(orchestrator))
    }

    /// Upgrade the connection; the role is decided later by what the peer sends
    async fn handle_websocket(
        ws: WebSocketUpgrade,
        State(transport): State<HubWebSocket>,
    ) -> impl IntoResponse {
        debug!("WebSocket upgrade requested");
        ws.on_upgrade(move |socket: WebSocket| async move {
            transport.handle_connection(socket).await;
        })
    }
}
