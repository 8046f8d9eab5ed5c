// ABOUTME: HTTP route assembly for the hub's observer-facing API
// ABOUTME: Thin handlers translating JSON requests into orchestrator calls and AppResult into responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! HTTP routes
//!
//! Handlers only extract and normalize request fields; every decision is
//! made by the [`SessionOrchestrator`]. Errors become
//! `{"error": {"code", "message"}}` bodies through `AppError`'s
//! `IntoResponse`.

/// Alarm set/cancel/query endpoints
pub mod alarm;
/// Device listing endpoint
pub mod devices;
/// Dimmer control endpoints
pub mod dimmer;
/// Health and readiness endpoints
pub mod health;
/// Light brightness and sunrise endpoints
pub mod light;
/// Monitoring control and session endpoints
pub mod sleep;
/// `WebSocket` upgrade endpoint
pub mod websocket;

pub use alarm::AlarmRoutes;
pub use devices::DeviceRoutes;
pub use dimmer::DimmerRoutes;
pub use health::HealthRoutes;
pub use light::LightRoutes;
pub use sleep::SleepRoutes;
pub use websocket::WebSocketRoutes;

use axum::{extract::FromRequest, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sleephub_core::errors::{AppError, AppResult};
use std::sync::Arc;

use crate::orchestrator::alarm::{
    clamp_percentage, deserialize_device_id, leading_integer, require_device_id,
};
use crate::orchestrator::SessionOrchestrator;

/// Shared state of every stateful route
pub type SharedOrchestrator = Arc<SessionOrchestrator>;

/// All hub routes
pub struct HubRoutes;

impl HubRoutes {
    /// Merge every route group onto one router
    pub fn routes(orchestrator: SharedOrchestrator) -> Router {
        Router::new()
            .merge(HealthRoutes::routes(Arc::clone(&orchestrator)))
            .merge(WebSocketRoutes::routes(Arc::clone(&orchestrator)))
            .merge(AlarmRoutes::routes(Arc::clone(&orchestrator)))
            .merge(SleepRoutes::routes(Arc::clone(&orchestrator)))
            .merge(DeviceRoutes::routes(Arc::clone(&orchestrator)))
            .merge(DimmerRoutes::routes(Arc::clone(&orchestrator)))
            .merge(LightRoutes::routes(orchestrator))
    }
}

/// JSON request body whose rejections use the hub's error body
///
/// Plain `Json` answers a mistyped body with a text/plain 422; this keeps
/// every failure in `{"error": {"code", "message"}}` form.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Body of requests that only name a device
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    /// Target device
    #[serde(default, deserialize_with = "deserialize_device_id")]
    pub device_id: Option<String>,
}

impl DeviceRequest {
    /// The device id, required and non-blank
    ///
    /// # Errors
    ///
    /// `MissingRequiredField` when absent or blank
    pub fn device_id(&self) -> AppResult<&str> {
        require_device_id(self.device_id.as_deref())
    }
}

/// `{"success": true, "message": ...}` plus any extra fields
pub(crate) fn success(message: impl Into<String>, extra: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    body.insert("message".into(), Value::String(message.into()));
    if let Value::Object(fields) = extra {
        body.extend(fields);
    }
    Json(Value::Object(body))
}

/// Shorthand for a success body without extra fields
pub(crate) fn success_message(message: impl Into<String>) -> Json<Value> {
    success(message, json!({}))
}

/// Required brightness percentage, clamped to 0..=100
pub(crate) fn required_level(value: Option<&Value>, field: &str) -> AppResult<u8> {
    match value {
        None | Some(Value::Null) => Err(AppError::missing_field(field)),
        Some(raw) => leading_integer(raw)
            .map(clamp_percentage)
            .ok_or_else(|| AppError::invalid_format(field, "expected a number")),
    }
}

/// Optional brightness percentage, clamped to 0..=100
pub(crate) fn optional_level(value: Option<&Value>, field: &str) -> AppResult<Option<u8>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        some => required_level(some, field).map(Some),
    }
}
