// ABOUTME: Real WebSocket server E2E tests with a device client and an observer client
// ABOUTME: Serves the full router on an ephemeral port and talks over tokio-tungstenite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use common::TestHub;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sleephub_server::config::ServerConfig;
use sleephub_server::orchestrator::SetAlarmRequest;
use sleephub_server::server::HubServer;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Hub served on an ephemeral port until dropped
struct TestServer {
    hub: TestHub,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    async fn start() -> Result<Self> {
        let hub = TestHub::new();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server =
            HubServer::with_orchestrator(ServerConfig::default(), hub.orchestrator.clone());
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Ok(Self {
            hub,
            addr,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    async fn connect(&self) -> Result<Client> {
        let expected = self.hub.orchestrator.stats().await.connections + 1;
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr)).await?;
        self.wait_for_connections(expected).await;
        Ok(client)
    }

    /// Block until the hub has attached `count` transports
    async fn wait_for_connections(&self, count: usize) {
        for _ in 0..100 {
            if self.hub.orchestrator.stats().await.connections == count {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("hub never reached {count} connections");
    }

    async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            // Graceful shutdown waits for open sockets, so bound it
            if let Ok(joined) = timeout(Duration::from_secs(2), handle).await {
                joined??;
            }
        }
        Ok(())
    }
}

async fn send_json(client: &mut Client, value: &Value) -> Result<()> {
    client.send(Message::Text(value.to_string())).await?;
    Ok(())
}

/// Read frames until one satisfies `matches`
async fn next_matching(client: &mut Client, matches: impl Fn(&Value) -> bool) -> Value {
    timeout(READ_TIMEOUT, async {
        while let Some(message) = client.next().await {
            if let Ok(Message::Text(text)) = message {
                let value: Value = serde_json::from_str(&text).unwrap();
                if matches(&value) {
                    return value;
                }
            }
        }
        panic!("socket closed before the expected frame arrived");
    })
    .await
    .expect("timed out waiting for frame")
}

async fn next_event(client: &mut Client, kind: &str) -> Value {
    next_matching(client, |frame| frame["type"] == kind).await
}

async fn next_command(client: &mut Client, command: &str) -> Value {
    next_matching(client, |frame| frame["command"] == command).await
}

fn status(status: &str) -> Value {
    json!({"device_id": "bedside-1", "data_type": "device_status", "status": status})
}

#[tokio::test]
async fn test_device_and_observer_over_real_sockets() -> Result<()> {
    let server = TestServer::start().await?;
    let mut observer = server.connect().await?;
    let mut device = server.connect().await?;

    send_json(&mut device, &status("connected")).await?;
    let listing = next_event(&mut observer, "device_status").await;
    assert_eq!(listing["devices"][0]["deviceId"], "bedside-1");

    // Observer-side request through the orchestrator reaches the device socket
    let target = server.hub.now() + ChronoDuration::hours(4);
    let request: SetAlarmRequest = serde_json::from_value(json!({
        "deviceId": "bedside-1",
        "targetWakeTime": target.timestamp_millis()
    }))?;
    let response = server.hub.orchestrator.set_alarm(&request).await?;
    assert!(response.monitoring_requested);
    next_command(&mut device, "start_monitoring").await;

    send_json(&mut device, &status("monitoring_started")).await?;
    let listing = next_event(&mut observer, "device_status").await;
    assert_eq!(listing["devices"][0]["isMonitoring"], true);

    server.hub.advance(ChronoDuration::minutes(10));
    send_json(&mut device, &status("sleep_detected")).await?;

    let armed = next_command(&mut device, "set_alarm").await;
    assert_eq!(armed["delay_ms"], 180 * 60_000);
    let detected = next_event(&mut observer, "sleep_detected").await;
    assert_eq!(detected["sleepInfo"]["cyclesToTarget"], 2);

    send_json(&mut device, &status("alarm_triggered")).await?;
    let dimming = next_command(&mut device, "bulb_dimming").await;
    assert_eq!(dimming["interval_ms"], 4000);
    next_event(&mut observer, "alarm_triggered").await;

    device.close(None).await?;
    let listing = next_event(&mut observer, "device_status").await;
    assert_eq!(listing["devices"], json!([]));

    observer.close(None).await?;
    server.stop().await
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() -> Result<()> {
    let server = TestServer::start().await?;
    let mut observer = server.connect().await?;
    let mut device = server.connect().await?;

    device.send(Message::Text("{definitely not json".into())).await?;
    device.send(Message::Binary(vec![1, 2, 3])).await?;
    send_json(&mut device, &json!({"status": "connected"})).await?;
    send_json(&mut device, &json!({"device_id": "bedside-1", "status": "teleported"})).await?;

    // Still served after every bad frame
    send_json(&mut device, &status("connected")).await?;
    let listing = next_event(&mut observer, "device_status").await;
    assert_eq!(listing["devices"][0]["deviceId"], "bedside-1");
    assert_eq!(server.hub.orchestrator.stats().await.connections, 2);

    device.close(None).await?;
    observer.close(None).await?;
    server.stop().await
}

#[tokio::test]
async fn test_sleep_data_streams_to_every_observer() -> Result<()> {
    let server = TestServer::start().await?;
    let mut first = server.connect().await?;
    let mut second = server.connect().await?;
    let mut device = server.connect().await?;

    send_json(&mut device, &status("connected")).await?;
    send_json(
        &mut device,
        &json!({
            "device_id": "bedside-1",
            "data_type": "sleep_data",
            "data": [{"sleep_stage": 2, "movement_score": 0.02, "timestamp": 0}]
        }),
    )
    .await?;

    for observer in [&mut first, &mut second] {
        let event = next_event(observer, "sleep_data").await;
        assert_eq!(event["deviceId"], "bedside-1");
        assert_eq!(event["analysis"]["sleepStage"], 2);
    }

    let session = server.hub.orchestrator.get_session("bedside-1").await?;
    assert_eq!(session.samples.len(), 1);

    for client in [&mut first, &mut second, &mut device] {
        client.close(None).await?;
    }
    server.stop().await
}
