// ABOUTME: End-to-end alarm flow through the orchestrator on a manual clock
// ABOUTME: From setting an alarm to the bulb dimming when the device fires it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use common::{base_time, TestHub};
use serde_json::json;
use sleephub_server::orchestrator::SetAlarmRequest;
use sleephub_server::registry::DevicePhase;

const MINUTE_MS: i64 = 60_000;

#[tokio::test]
async fn test_full_night_alarm_flow() {
    let hub = TestHub::new();
    let mut device = hub.device("bedside-1").await;
    let mut dashboard_a = hub.observer().await;
    let mut dashboard_b = hub.observer().await;

    // Wake no later than four hours from now, with a custom dimming curve
    let target = base_time() + Duration::hours(4);
    let request: SetAlarmRequest = serde_json::from_value(json!({
        "deviceId": "bedside-1",
        "targetWakeTime": target.to_rfc3339(),
        "pattern": 2,
        "maxBright": "80",
        "intervalMs": 50
    }))
    .unwrap();
    let response = hub.orchestrator.set_alarm(&request).await.unwrap();
    assert!(response.monitoring_requested);
    assert_eq!(response.interval_ms, 4000);
    assert_eq!(device.drain_command("start_monitoring").len(), 1);

    // Device acknowledges and streams a batch
    hub.frame(
        &device,
        &json!({"device_id": "bedside-1", "data_type": "device_status", "status": "monitoring_started"}),
    )
    .await;
    hub.frame(
        &device,
        &json!({
            "device_id": "bedside-1",
            "data_type": "sleep_data",
            "data": [
                {"sleep_stage": 1, "movement_score": 0.3, "timestamp": 0},
                {"sleep_stage": 1, "movement_score": 0.1, "timestamp": 60_000}
            ]
        }),
    )
    .await;
    assert_eq!(dashboard_a.drain_kind("sleep_data").len(), 1);
    dashboard_b.drain();

    // Sleep onset ten minutes later
    hub.advance(Duration::minutes(10));
    hub.frame(
        &device,
        &json!({"device_id": "bedside-1", "data_type": "device_status", "status": "sleep_detected"}),
    )
    .await;

    // 230 minutes remain: the latest boundary is two cycles (180 min) after onset
    let armed = device.drain_command("set_alarm");
    assert_eq!(armed, [json!({"command": "set_alarm", "delay_ms": 180 * MINUTE_MS})]);

    let onset = base_time() + Duration::minutes(10);
    let recommended = onset + Duration::minutes(180);
    for dashboard in [&mut dashboard_a, &mut dashboard_b] {
        let events = dashboard.drain_kind("sleep_detected");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["deviceId"], "bedside-1");
        assert_eq!(events[0]["sleepInfo"]["cyclesToTarget"], 2);
        assert_eq!(
            events[0]["sleepInfo"]["sleepStartTime"],
            onset.timestamp_millis()
        );
        assert_eq!(
            events[0]["sleepInfo"]["recommendedAlarmTime"],
            recommended.timestamp_millis()
        );
    }

    let setting = hub.orchestrator.get_alarm("bedside-1").await.unwrap();
    assert!(setting.sleep_detected);
    assert_eq!(setting.cycles_to_target, Some(2));
    assert_eq!(setting.recommended_time, Some(recommended));
    assert!(setting.recommended_time.unwrap() <= setting.target_wake_time);
    assert_eq!(setting.sleep_detected_at, Some(onset));

    let devices = hub.orchestrator.list_devices().await;
    assert!(devices[0].alarm_active);
    assert_eq!(devices[0].phase, DevicePhase::AlarmScheduled);

    // The device counts down on its own and reports the alarm
    hub.advance(Duration::minutes(180));
    hub.frame(
        &device,
        &json!({"device_id": "bedside-1", "data_type": "device_status", "status": "alarm_triggered"}),
    )
    .await;

    let dimming = device.drain_command("bulb_dimming");
    assert_eq!(
        dimming,
        [json!({"command": "bulb_dimming", "pattern": 2, "maxBright": 80, "interval_ms": 4000})]
    );
    let fired = dashboard_a.drain_kind("alarm_triggered");
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0]["timestamp"], hub.now().timestamp_millis());

    let devices = hub.orchestrator.list_devices().await;
    assert!(!devices[0].alarm_active);
    assert_eq!(devices[0].phase, DevicePhase::Monitoring);

    // The setting outlives the alarm until it is cancelled
    assert!(hub.orchestrator.get_alarm("bedside-1").await.is_ok());
    hub.orchestrator.cancel_alarm("bedside-1").await.unwrap();
    assert!(hub.orchestrator.get_alarm("bedside-1").await.is_err());
}

#[tokio::test]
async fn test_reconnected_device_receives_alarm() {
    let hub = TestHub::new();
    let mut first = hub.device("bedside-1").await;
    hub.orchestrator
        .set_alarm(
            &serde_json::from_value(json!({
                "deviceId": "bedside-1",
                "targetWakeTime": (base_time() + Duration::minutes(100)).timestamp_millis()
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    first.drain();

    // Same id on a new transport without any handshake
    let mut second = hub.device("bedside-1").await;
    hub.frame(
        &second,
        &json!({"device_id": "bedside-1", "status": "sleep_detected"}),
    )
    .await;

    assert_eq!(
        second.drain_command("set_alarm"),
        [json!({"command": "set_alarm", "delay_ms": 90 * MINUTE_MS})]
    );

    // The displaced transport is an observer now: events, never commands
    assert!(hub.orchestrator.is_observer(first.id).await);
    let frames = first.drain();
    assert!(frames.iter().all(|frame| frame.get("command").is_none()));
    assert!(frames.iter().any(|frame| frame["type"] == "sleep_detected"));
}
