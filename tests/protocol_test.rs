// ABOUTME: Tests for the device wire protocol and observer event encoding
// ABOUTME: Decoding of device envelopes and the JSON shape of everything the hub sends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use sleephub_server::errors::ProtocolError;
use sleephub_server::models::{AnalysisSnapshot, SleepStage};
use sleephub_server::protocol::{
    decode, DeviceCommand, DeviceStatusKind, HubEvent, InboundEvent, SleepInfo,
};
use sleephub_server::registry::DeviceFlags;

fn decode_value(value: &Value) -> Result<Vec<InboundEvent>, ProtocolError> {
    decode(&value.to_string())
}

// ============================================================================
// Inbound decoding
// ============================================================================

#[test]
fn test_decode_connected_with_flags() {
    let events = decode_value(&json!({
        "device_id": "bedside-1",
        "data_type": "device_status",
        "status": "connected",
        "monitoring": true,
        "alarm_active": 0
    }))
    .unwrap();

    assert_eq!(
        events,
        vec![InboundEvent::Status {
            device_id: "bedside-1".into(),
            status: DeviceStatusKind::Connected,
            flags: DeviceFlags {
                monitoring: true,
                alarm_active: false,
            },
        }]
    );
}

#[test]
fn test_decode_every_status_kind() {
    for (raw, expected) in [
        ("connected", DeviceStatusKind::Connected),
        ("monitoring_started", DeviceStatusKind::MonitoringStarted),
        ("monitoring_stopped", DeviceStatusKind::MonitoringStopped),
        ("sleep_detected", DeviceStatusKind::SleepDetected),
        ("alarm_triggered", DeviceStatusKind::AlarmTriggered),
    ] {
        let events = decode_value(&json!({"device_id": "d", "status": raw})).unwrap();
        match &events[..] {
            [InboundEvent::Status { status, .. }] => assert_eq!(*status, expected),
            other => panic!("unexpected events for {raw}: {other:?}"),
        }
        assert_eq!(expected.as_str(), raw);
    }
}

#[test]
fn test_decode_sleep_data_is_lenient() {
    let events = decode_value(&json!({
        "device_id": "bedside-1",
        "data_type": "sleep_data",
        "data": [
            {"sleep_stage": 2, "movement_score": 0.05, "timestamp": 1000},
            {"sleep_stage": "??"},
            42
        ]
    }))
    .unwrap();

    let [InboundEvent::SleepData { device_id, samples }] = &events[..] else {
        panic!("expected one sleep_data event, got {events:?}");
    };
    assert_eq!(device_id, "bedside-1");
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[0].stage, SleepStage::Deep);
    assert_eq!(samples[0].timestamp, Some(1000));
    assert_eq!(samples[1].stage, SleepStage::Awake);
    assert_eq!(samples[2].timestamp, None);
}

#[test]
fn test_decode_non_array_payload_is_empty_batch() {
    let events = decode_value(&json!({
        "device_id": "bedside-1",
        "data_type": "sleep_data",
        "data": {"sleep_stage": 1}
    }))
    .unwrap();

    assert!(matches!(
        &events[..],
        [InboundEvent::SleepData { samples, .. }] if samples.is_empty()
    ));
}

#[test]
fn test_decode_data_and_status_in_one_envelope() {
    let events = decode_value(&json!({
        "device_id": "bedside-1",
        "data_type": "sleep_data",
        "status": "sleep_detected",
        "data": []
    }))
    .unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], InboundEvent::SleepData { .. }));
    assert!(matches!(
        events[1],
        InboundEvent::Status {
            status: DeviceStatusKind::SleepDetected,
            ..
        }
    ));
}

#[test]
fn test_decode_status_without_status_is_heartbeat() {
    let events = decode_value(&json!({"device_id": "bedside-1", "data_type": "device_status"}))
        .unwrap();

    assert_eq!(
        events,
        vec![InboundEvent::Heartbeat {
            device_id: "bedside-1".into()
        }]
    );
    assert_eq!(events[0].device_id(), "bedside-1");
}

#[test]
fn test_decode_rejects_malformed_json() {
    assert!(matches!(
        decode("{not json"),
        Err(ProtocolError::MalformedJson { .. })
    ));
    assert!(matches!(
        decode("[1, 2, 3]"),
        Err(ProtocolError::MalformedJson { .. })
    ));
}

#[test]
fn test_decode_requires_device_id() {
    for frame in [
        json!({"status": "connected"}),
        json!({"device_id": "   ", "status": "connected"}),
    ] {
        assert!(matches!(
            decode_value(&frame),
            Err(ProtocolError::MissingField { field: "device_id" })
        ));
    }
}

#[test]
fn test_decode_unknown_kinds() {
    assert!(matches!(
        decode_value(&json!({"device_id": "d", "data_type": "heart_rate"})),
        Err(ProtocolError::UnknownDataType { data_type }) if data_type == "heart_rate"
    ));
    assert!(matches!(
        decode_value(&json!({"device_id": "d", "status": "dozing"})),
        Err(ProtocolError::UnknownStatus { status }) if status == "dozing"
    ));
    assert!(matches!(
        decode_value(&json!({"device_id": "d"})),
        Err(ProtocolError::MissingField { field: "data_type" })
    ));
}

#[test]
fn test_decode_keeps_known_part_of_mixed_envelope() {
    let events = decode_value(&json!({
        "device_id": "d",
        "data_type": "heart_rate",
        "status": "monitoring_started"
    }))
    .unwrap();

    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        InboundEvent::Status {
            status: DeviceStatusKind::MonitoringStarted,
            ..
        }
    ));
}

// ============================================================================
// Outbound commands
// ============================================================================

#[test]
fn test_command_wire_shapes() {
    let at = Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap();

    let cases = [
        (
            DeviceCommand::StartMonitoring { timestamp: at },
            json!({"command": "start_monitoring", "timestamp": 1_700_000_000_000_i64}),
        ),
        (
            DeviceCommand::SetAlarm {
                delay_ms: 10_800_000,
            },
            json!({"command": "set_alarm", "delay_ms": 10_800_000}),
        ),
        (
            DeviceCommand::CancelAlarm { timestamp: at },
            json!({"command": "cancel_alarm", "timestamp": 1_700_000_000_000_i64}),
        ),
        (
            DeviceCommand::BulbDimming {
                pattern: 2,
                max_bright: 80,
                interval_ms: Some(4000),
            },
            json!({"command": "bulb_dimming", "pattern": 2, "maxBright": 80, "interval_ms": 4000}),
        ),
        (
            DeviceCommand::BulbDimming {
                pattern: 1,
                max_bright: 100,
                interval_ms: None,
            },
            json!({"command": "bulb_dimming", "pattern": 1, "maxBright": 100}),
        ),
        (
            DeviceCommand::BulbPower { on: true },
            json!({"command": "bulb_power", "on": true}),
        ),
        (
            DeviceCommand::SetPowerClamped { level: 40 },
            json!({"command": "set_power_clamped", "level": 40}),
        ),
        (
            DeviceCommand::SetBrightness { level: 75 },
            json!({"command": "set_brightness", "level": 75}),
        ),
        (
            DeviceCommand::SunriseStart {
                duration_ms: 900_000,
                target_level: 100,
            },
            json!({"command": "sunrise_start", "duration_ms": 900_000, "target_level": 100}),
        ),
        (
            DeviceCommand::SunriseCancel,
            json!({"command": "sunrise_cancel"}),
        ),
    ];

    for (command, expected) in cases {
        assert_eq!(serde_json::to_value(&command).unwrap(), expected);
        assert_eq!(expected["command"], command.name());
    }
}

// ============================================================================
// Observer events
// ============================================================================

#[test]
fn test_sleep_detected_event_shape() {
    let start = Utc.timestamp_millis_opt(1_000).single().unwrap();
    let wake = Utc.timestamp_millis_opt(5_401_000).single().unwrap();
    let event = HubEvent::SleepDetected {
        device_id: "bedside-1".into(),
        sleep_info: SleepInfo {
            sleep_start_time: start,
            recommended_alarm_time: wake,
            cycles_to_target: 1,
        },
        timestamp: start,
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(event.kind(), "sleep_detected");
    assert_eq!(
        value,
        json!({
            "type": "sleep_detected",
            "deviceId": "bedside-1",
            "sleepInfo": {
                "sleepStartTime": 1_000,
                "recommendedAlarmTime": 5_401_000,
                "cyclesToTarget": 1
            },
            "timestamp": 1_000
        })
    );
}

#[test]
fn test_sleep_data_event_shape() {
    let at = Utc.timestamp_millis_opt(42).single().unwrap();
    let event = HubEvent::SleepData {
        device_id: "bedside-1".into(),
        analysis: AnalysisSnapshot::default(),
        timestamp: at,
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "sleep_data");
    assert_eq!(value["deviceId"], "bedside-1");
    assert_eq!(value["analysis"]["sleepStage"], 0);
    assert_eq!(value["timestamp"], 42);
}

#[test]
fn test_alarm_triggered_and_status_event_shapes() {
    let at = Utc.timestamp_millis_opt(7).single().unwrap();

    let triggered = serde_json::to_value(HubEvent::AlarmTriggered {
        device_id: "d".into(),
        timestamp: at,
    })
    .unwrap();
    assert_eq!(
        triggered,
        json!({"type": "alarm_triggered", "deviceId": "d", "timestamp": 7})
    );

    let status = serde_json::to_value(HubEvent::DeviceStatus { devices: vec![] }).unwrap();
    assert_eq!(status, json!({"type": "device_status", "devices": []}));
}
