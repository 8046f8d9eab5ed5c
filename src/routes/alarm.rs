// ABOUTME: Alarm route handlers for arming and cancelling wake-up alarms
// ABOUTME: Arming an alarm also asks the device to start sleep monitoring
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

use super::{success, success_message, DeviceRequest, JsonBody, SharedOrchestrator};
use crate::orchestrator::{AlarmSetting, SetAlarmRequest};

/// Alarm routes implementation
pub struct AlarmRoutes;

impl AlarmRoutes {
    /// Create all alarm routes
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/api/alarm/set", post(Self::handle_set))
            .route("/api/alarm/cancel", post(Self::handle_cancel))
            .route("/api/alarm/:device_id", get(Self::handle_get))
            .with_state(orchestrator)
    }

    async fn handle_set(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<SetAlarmRequest>,
    ) -> AppResult<Json<Value>> {
        let accepted = orchestrator.set_alarm(&request).await?;
        let message = if accepted.monitoring_requested {
            "Alarm set and sleep monitoring started"
        } else {
            "Alarm set; monitoring starts when the device connects"
        };
        Ok(success(message, serde_json::to_value(&accepted)?))
    }

    async fn handle_cancel(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<DeviceRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = request.device_id()?;
        orchestrator.cancel_alarm(device_id).await?;
        Ok(success_message("Alarm cancelled"))
    }

    async fn handle_get(
        State(orchestrator): State<SharedOrchestrator>,
        Path(device_id): Path<String>,
    ) -> AppResult<Json<AlarmSetting>> {
        Ok(Json(orchestrator.get_alarm(&device_id).await?))
    }
}
