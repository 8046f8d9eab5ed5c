// ABOUTME: Unified error types for the Sleephub hub with codes and HTTP mapping
// ABOUTME: Defines AppError with its ErrorCode and HTTP error body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! # Unified Error Handling System
//!
//! Every caller-facing failure of the hub is an [`AppError`] carrying an
//! [`ErrorCode`]. The routing layer translates the code into an HTTP status
//! and the JSON body defined by [`ErrorResponse`]. Malformed transport input
//! is a separate concern, see [`ProtocolError`].

/// Errors raised while decoding inbound transport messages
pub mod protocol;

pub use protocol::ProtocolError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard error codes used throughout the hub
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    /// Input failed validation
    InvalidInput,
    /// A required field is absent
    MissingRequiredField,
    /// A field is present but unparseable (dates, numbers)
    InvalidFormat,
    /// A numeric field is outside its accepted range
    ValueOutOfRange,

    // Resources
    /// Unknown device, session, or alarm
    ResourceNotFound,
    /// Known device whose transport is not open
    DeviceUnavailable,

    // Internal
    /// Serialization of an outbound payload failed
    SerializationError,
    /// Configuration is invalid
    ConfigError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput
            | Self::MissingRequiredField
            | Self::InvalidFormat
            | Self::ValueOutOfRange => 400,
            Self::ResourceNotFound => 404,
            Self::DeviceUnavailable => 503,
            Self::SerializationError | Self::ConfigError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidFormat => "The data format is invalid",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::DeviceUnavailable => "The device is not connected",
            Self::SerializationError => "Data serialization failed",
            Self::ConfigError => "Configuration error encountered",
        }
    }

    /// Whether this code belongs to the validation family
    #[must_use]
    pub const fn is_validation(self) -> bool {
        matches!(
            self,
            Self::InvalidInput
                | Self::MissingRequiredField
                | Self::InvalidFormat
                | Self::ValueOutOfRange
        )
    }
}

/// Unified error type for the hub
#[derive(Debug, thiserror::Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Request ID for tracing, when the routing layer supplies one
    pub request_id: Option<String>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: None,
        }
    }

    /// Attach a request ID
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field '{field}'"),
        )
    }

    /// Unparseable field
    pub fn invalid_format(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Invalid format for '{field}': {reason}"),
        )
    }

    /// Value outside its range
    pub fn out_of_range(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ValueOutOfRange,
            format!("Value of '{field}' is out of range: {reason}"),
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Device known but its transport is closed
    pub fn device_unavailable(device_id: &str) -> Self {
        Self::new(
            ErrorCode::DeviceUnavailable,
            format!("Device {device_id} is not connected"),
        )
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Request ID, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                request_id: error.request_id,
            },
        }
    }
}

#[cfg(feature = "http-response")]
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;

        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                Self::invalid_format("body", rejection.body_text())
            }
            other => Self::invalid_input(other.body_text()),
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        } else if self.code.is_validation() {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        } else {
            tracing::info!(code = ?self.code, message = %self.message, "Request not served");
        }
        (status, axum::Json(ErrorResponse::from(self))).into_response()
    }
}
