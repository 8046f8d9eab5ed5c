// ABOUTME: Device listing route handler
// ABOUTME: Returns every registered device with its flags and state machine phase
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::SharedOrchestrator;
use crate::registry::DeviceSummary;

/// Body of `GET /api/devices`
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    /// Registered devices, ordered by id
    pub devices: Vec<DeviceSummary>,
}

/// Device routes implementation
pub struct DeviceRoutes;

impl DeviceRoutes {
    /// Create the device listing route
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/api/devices", get(Self::handle_list))
            .with_state(orchestrator)
    }

    async fn handle_list(
        State(orchestrator): State<SharedOrchestrator>,
    ) -> Json<DeviceListResponse> {
        Json(DeviceListResponse {
            devices: orchestrator.list_devices().await,
        })
    }
}
