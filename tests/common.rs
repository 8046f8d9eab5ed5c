// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a manually clocked orchestrator with fake channel transports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `sleephub_server`
//!
//! Transports are plain unbounded channels: the test keeps the receiver and
//! reads back exactly what the hub would have written to the socket.

use axum::extract::ws::Message;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use sleephub_server::clock::ManualClock;
use sleephub_server::config::AlarmConfig;
use sleephub_server::orchestrator::SessionOrchestrator;
use sleephub_server::registry::ConnectionId;
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed starting instant for deterministic scenarios
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0)
        .single()
        .expect("valid base time")
}

/// Orchestrator on a manual clock starting at [`base_time`]
pub struct TestHub {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub clock: Arc<ManualClock>,
}

impl TestHub {
    pub fn new() -> Self {
        Self::with_config(AlarmConfig::default())
    }

    pub fn with_config(config: AlarmConfig) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::new(base_time()));
        let orchestrator = Arc::new(SessionOrchestrator::with_clock(config, clock.clone()));
        Self {
            orchestrator,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use sleephub_server::clock::Clock;
        self.clock.now()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Attach a transport that stays an observer
    pub async fn observer(&self) -> FakeTransport {
        let transport = FakeTransport::new();
        self.orchestrator
            .attach(transport.id, transport.tx.clone())
            .await;
        transport
    }

    /// Attach a transport and register `device_id` on it
    pub async fn device(&self, device_id: &str) -> FakeTransport {
        let transport = self.observer().await;
        self.frame(
            &transport,
            &serde_json::json!({"device_id": device_id, "status": "connected"}),
        )
        .await;
        transport
    }

    /// Feed one JSON frame as if received on `transport`
    pub async fn frame(&self, transport: &FakeTransport, frame: &Value) {
        self.orchestrator
            .handle_frame(transport.id, &frame.to_string())
            .await
            .expect("frame should decode");
    }
}

/// In-memory stand-in for a `WebSocket` transport
pub struct FakeTransport {
    pub id: ConnectionId,
    pub tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4(),
            tx,
            rx,
        }
    }

    /// Every frame queued so far, decoded as JSON
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            if let Message::Text(text) = message {
                frames.push(serde_json::from_str(&text).expect("hub frames are JSON"));
            }
        }
        frames
    }

    /// Queued frames whose `type` field equals `kind`
    pub fn drain_kind(&mut self, kind: &str) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter(|frame| frame["type"] == kind)
            .collect()
    }

    /// Queued frames whose `command` field equals `command`
    pub fn drain_command(&mut self, command: &str) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter(|frame| frame["command"] == command)
            .collect()
    }

    /// Simulate the socket closing on the hub side
    pub fn close(&mut self) {
        self.rx.close();
    }
}
