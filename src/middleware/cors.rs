// ABOUTME: CORS middleware configuration for the hub's HTTP API
// ABOUTME: Lets browser dashboards on other origins call the observer endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::ServerConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// An empty value or `*` allows any origin; otherwise the value is a
/// comma-separated origin list. Unparseable entries are skipped, and a list
/// with no usable entry falls back to any origin.
#[must_use]
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let configured = config.cors_allowed_origins.trim();
    let allow_origin = if configured.is_empty() || configured == "*" {
        if config.environment.is_production() {
            warn!("CORS allows any origin in production; set CORS_ALLOWED_ORIGINS");
        }
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = configured
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}
