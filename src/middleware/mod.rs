// ABOUTME: HTTP middleware for the hub's router
// ABOUTME: Currently CORS for browser dashboards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

/// Cross-origin request policy
pub mod cors;

pub use cors::setup_cors;
