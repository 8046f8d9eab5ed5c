// ABOUTME: Light route handlers for direct brightness and sunrise ramps
// ABOUTME: Levels are clamped to 0..=100; sunrise falls back to configured defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sleephub_core::errors::AppResult;

use super::dimmer::LevelRequest;
use super::{
    optional_level, required_level, success, success_message, DeviceRequest, JsonBody,
    SharedOrchestrator,
};
use crate::orchestrator::alarm::{deserialize_device_id, leading_integer, require_device_id};

/// Body of `POST /api/light/sunrise`
///
/// The ramp fields keep the device's snake case spelling.
#[derive(Debug, Default, Deserialize)]
pub struct SunriseRequest {
    /// Target device
    #[serde(default, rename = "deviceId", deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
    /// Ramp length
    #[serde(default, alias = "durationMs")]
    pub duration_ms: Option<Value>,
    /// Brightness percentage reached at the end
    #[serde(default, alias = "targetLevel")]
    pub target_level: Option<Value>,
}

/// Light routes implementation
pub struct LightRoutes;

impl LightRoutes {
    /// Create all light routes
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/api/light/brightness", post(Self::handle_brightness))
            .route("/api/light/sunrise", post(Self::handle_sunrise))
            .route("/api/light/sunrise/cancel", post(Self::handle_sunrise_cancel))
            .with_state(orchestrator)
    }

    async fn handle_brightness(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<LevelRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = require_device_id(request.device_id.as_deref())?;
        let level = required_level(request.level.as_ref(), "level")?;

        let command = orchestrator.set_light_brightness(device_id, level).await?;
        Ok(success("Brightness command sent", json!({ "command": command })))
    }

    async fn handle_sunrise(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<SunriseRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = require_device_id(request.device_id.as_deref())?;
        let duration_ms = request
            .duration_ms
            .as_ref()
            .and_then(leading_integer)
            .and_then(|ms| u64::try_from(ms).ok());
        let target_level = optional_level(request.target_level.as_ref(), "target_level")?;

        let command = orchestrator
            .start_sunrise(device_id, duration_ms, target_level)
            .await?;
        Ok(success("Sunrise started", json!({ "command": command })))
    }

    async fn handle_sunrise_cancel(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<DeviceRequest>,
    ) -> AppResult<Json<Value>> {
        orchestrator.cancel_sunrise(request.device_id()?).await?;
        Ok(success_message("Sunrise cancelled"))
    }
}
