// ABOUTME: Sleep monitoring route handlers
// ABOUTME: Forwards start/stop requests to devices and exposes the current session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use sleephub_core::errors::AppResult;

use super::{success_message, DeviceRequest, JsonBody, SharedOrchestrator};
use crate::sample_store::SleepSession;

/// Sleep monitoring routes implementation
pub struct SleepRoutes;

impl SleepRoutes {
    /// Create all sleep monitoring routes
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/api/sleep/start", post(Self::handle_start))
            .route("/api/sleep/stop", post(Self::handle_stop))
            .route("/api/sleep/session/:device_id", get(Self::handle_session))
            .with_state(orchestrator)
    }

    async fn handle_start(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<DeviceRequest>,
    ) -> AppResult<Json<Value>> {
        orchestrator
            .request_start_monitoring(request.device_id()?)
            .await?;
        Ok(success_message("Sleep monitoring started"))
    }

    async fn handle_stop(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<DeviceRequest>,
    ) -> AppResult<Json<Value>> {
        orchestrator
            .request_stop_monitoring(request.device_id()?)
            .await?;
        Ok(success_message("Sleep monitoring stopped"))
    }

    async fn handle_session(
        State(orchestrator): State<SharedOrchestrator>,
        Path(device_id): Path<String>,
    ) -> AppResult<Json<SleepSession>> {
        Ok(Json(orchestrator.get_session(&device_id).await?))
    }
}
