// ABOUTME: Core types and constants for the Sleephub sleep-cycle alarm hub
// ABOUTME: Foundation crate shared by the analyzer crate and the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![deny(unsafe_code)]

//! # Sleephub Core
//!
//! Foundation crate providing shared types and constants for the Sleephub
//! hub. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ProtocolError`
//! - **constants**: Sleep cycle length, alarm floors and defaults
//! - **models**: Sleep samples, stages, and analysis snapshots

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Sleep domain models
pub mod models;
