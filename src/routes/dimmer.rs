// ABOUTME: Dimmer control route handlers for bulb power and dimming
// ABOUTME: Unknown devices are 404, devices whose transport is closed are 503
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sleephub_core::errors::{AppError, AppResult};

use super::{optional_level, required_level, success, JsonBody, SharedOrchestrator};
use crate::orchestrator::alarm::{deserialize_device_id, leading_integer, require_device_id};

/// Body of `POST /api/dimmer/power`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerRequest {
    /// Target device
    #[serde(default, deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
    /// Desired power state
    #[serde(default)]
    pub on: Option<Value>,
}

/// Body of `POST /api/dimmer/pattern`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRequest {
    /// Target device
    #[serde(default, deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
    /// Dimming curve selector
    #[serde(default)]
    pub pattern: Option<Value>,
    /// Peak brightness percentage
    #[serde(default)]
    pub max_bright: Option<Value>,
    /// Dimming step period
    #[serde(default)]
    pub interval_ms: Option<Value>,
}

/// Body of brightness requests
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequest {
    /// Target device
    #[serde(default, deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
    /// Brightness percentage
    #[serde(default)]
    pub level: Option<Value>,
}

/// Dimmer routes implementation
pub struct DimmerRoutes;

impl DimmerRoutes {
    /// Create all dimmer routes
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .route("/api/dimmer/power", post(Self::handle_power))
            .route("/api/dimmer/pattern", post(Self::handle_pattern))
            .route("/api/dimmer/brightness", post(Self::handle_brightness))
            .with_state(orchestrator)
    }

    async fn handle_power(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<PowerRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = require_device_id(request.device_id.as_deref())?;
        let on = match request.on {
            None | Some(Value::Null) => return Err(AppError::missing_field("on")),
            Some(Value::Bool(on)) => on,
            Some(other) => leading_integer(&other)
                .map(|n| n != 0)
                .ok_or_else(|| AppError::invalid_format("on", "expected a boolean"))?,
        };

        orchestrator.set_bulb_power(device_id, on).await?;
        let state = if on { "ON" } else { "OFF" };
        Ok(success(format!("Bulb power: {state}"), json!({ "on": on })))
    }

    async fn handle_pattern(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<PatternRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = require_device_id(request.device_id.as_deref())?;
        let pattern = match request.pattern.as_ref().and_then(leading_integer) {
            None | Some(0) => return Err(AppError::missing_field("pattern")),
            Some(p) => u8::try_from(p)
                .map_err(|_| AppError::out_of_range("pattern", format!("{p} is not in 1..=255")))?,
        };
        let max_bright = optional_level(request.max_bright.as_ref(), "maxBright")?;
        let interval_ms = request
            .interval_ms
            .as_ref()
            .and_then(leading_integer)
            .and_then(|ms| u64::try_from(ms).ok());

        let command = orchestrator
            .start_dimming(device_id, pattern, max_bright, interval_ms)
            .await?;
        Ok(success(
            format!("Dimming pattern {pattern} started"),
            json!({ "command": command }),
        ))
    }

    async fn handle_brightness(
        State(orchestrator): State<SharedOrchestrator>,
        JsonBody(request): JsonBody<LevelRequest>,
    ) -> AppResult<Json<Value>> {
        let device_id = require_device_id(request.device_id.as_deref())?;
        let level = required_level(request.level.as_ref(), "level")?;

        let command = orchestrator.set_dimmer_level(device_id, level).await?;
        Ok(success(
            format!("Brightness set to {level}%"),
            json!({ "command": command }),
        ))
    }
}
