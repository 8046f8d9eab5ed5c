// ABOUTME: Session orchestrator owning all per-device hub state
// ABOUTME: Applies device events and observer requests, then issues commands and broadcasts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! # Session Orchestrator
//!
//! The only writer of the registry, the sample store and the alarm map.
//! All three live behind one coarse lock, so every device event and every
//! observer request is applied to completion before the next one starts.
//! Outbound sends never wait: they go to unbounded per-transport queues.
//!
//! Per device the state machine is
//! `Connected -> Monitoring -> SleepDetected -> AlarmScheduled`, returning
//! to `Connected`/`Monitoring` when the alarm fires, is cancelled, or
//! monitoring stops. The hub runs no timers of its own; the alarm countdown
//! lives on the device.

/// Alarm settings and request normalization
pub mod alarm;

pub use alarm::{AlarmSetResponse, AlarmSetting, DimmingParams, SetAlarmRequest};

use serde::Serialize;
use sleephub_core::constants::alarm::MAX_BRIGHTNESS;
use sleephub_core::errors::{AppError, AppResult, ProtocolError};
use sleephub_core::models::SleepSample;
use sleephub_intelligence::{AlarmScheduler, SleepStageAnalyzer};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::broadcast::{BroadcastDispatcher, DeliveryReport};
use crate::clock::{Clock, SystemClock};
use crate::config::AlarmConfig;
use crate::protocol::{decode, DeviceCommand, DeviceStatusKind, HubEvent, InboundEvent, SleepInfo};
use crate::registry::{
    ConnectionId, ConnectionRegistry, DeviceFlags, DevicePhase, DeviceSummary, Outbound,
};
use crate::sample_store::{SleepSampleStore, SleepSession};

/// What became of a device event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// State changed and side effects were issued
    Applied,
    /// Valid event with nothing to act on
    Ignored {
        /// Why nothing happened
        reason: &'static str,
    },
}

/// Everything guarded by the orchestrator lock
#[derive(Debug)]
struct HubState {
    registry: ConnectionRegistry,
    samples: SleepSampleStore,
    alarms: HashMap<String, AlarmSetting>,
}

impl HubState {
    fn broadcast(&self, event: &HubEvent) -> DeliveryReport {
        BroadcastDispatcher::broadcast(&self.registry, event)
    }

    fn broadcast_device_status(&self) -> DeliveryReport {
        self.broadcast(&HubEvent::DeviceStatus {
            devices: self.registry.devices(),
        })
    }
}

/// Stateful core of the hub
pub struct SessionOrchestrator {
    state: Mutex<HubState>,
    config: AlarmConfig,
    clock: Arc<dyn Clock>,
    analyzer: SleepStageAnalyzer,
    scheduler: AlarmScheduler,
}

impl SessionOrchestrator {
    /// Orchestrator on the wall clock
    #[must_use]
    pub fn new(config: AlarmConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Orchestrator on an explicit time source
    #[must_use]
    pub fn with_clock(config: AlarmConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(HubState {
                registry: ConnectionRegistry::new(),
                samples: SleepSampleStore::new(config.session_sample_capacity),
                alarms: HashMap::new(),
            }),
            config,
            clock,
            analyzer: SleepStageAnalyzer::default(),
            scheduler: AlarmScheduler::default(),
        }
    }

    /// Tunables in effect
    #[must_use]
    pub const fn config(&self) -> &AlarmConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Transport lifecycle
    // ------------------------------------------------------------------

    /// Track a new transport; it starts out as an observer
    pub async fn attach(&self, connection_id: ConnectionId, tx: Outbound) {
        self.state.lock().await.registry.attach(connection_id, tx);
    }

    /// Forget a closed transport
    ///
    /// If it owned a device, the device is removed and observers get a
    /// fresh device list. Sessions and alarm settings survive reconnects.
    pub async fn detach(&self, connection_id: ConnectionId) {
        let mut state = self.state.lock().await;
        if state.registry.detach(connection_id).is_some() {
            state.broadcast_device_status();
        }
    }

    /// Decode and apply one text frame received on `connection_id`
    ///
    /// # Errors
    ///
    /// Returns the decode error; nothing is applied in that case.
    pub async fn handle_frame(
        &self,
        connection_id: ConnectionId,
        text: &str,
    ) -> Result<Vec<EventOutcome>, ProtocolError> {
        let events = decode(text)?;
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.handle_event(connection_id, event).await);
        }
        Ok(outcomes)
    }

    // ------------------------------------------------------------------
    // Device events
    // ------------------------------------------------------------------

    /// Apply one decoded device event
    pub async fn handle_event(
        &self,
        connection_id: ConnectionId,
        event: InboundEvent,
    ) -> EventOutcome {
        let mut state = self.state.lock().await;
        let outcome = match event {
            InboundEvent::SleepData { device_id, samples } => {
                self.ingest_sleep_data(&mut state, &device_id, &samples)
            }
            InboundEvent::Status {
                device_id,
                status,
                flags,
            } => self.apply_status(&mut state, connection_id, &device_id, status, flags),
            InboundEvent::Heartbeat { device_id } => {
                debug!(device_id = %device_id, "Device status heartbeat");
                EventOutcome::Applied
            }
        };
        drop(state);

        if let EventOutcome::Ignored { reason } = outcome {
            info!(connection_id = %connection_id, reason, "Device event ignored");
        }
        outcome
    }

    fn apply_status(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        device_id: &str,
        status: DeviceStatusKind,
        flags: DeviceFlags,
    ) -> EventOutcome {
        match status {
            DeviceStatusKind::Connected => self.connect(state, connection_id, device_id, flags),
            DeviceStatusKind::MonitoringStarted => self.monitoring_started(state, device_id),
            DeviceStatusKind::MonitoringStopped => Self::monitoring_stopped(state, device_id),
            DeviceStatusKind::SleepDetected => self.sleep_detected(state, device_id),
            DeviceStatusKind::AlarmTriggered => self.alarm_triggered(state, device_id),
        }
    }

    fn connect(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        device_id: &str,
        flags: DeviceFlags,
    ) -> EventOutcome {
        let now = self.clock.now();
        if !state
            .registry
            .register_device(connection_id, device_id, flags, now)
        {
            return EventOutcome::Ignored {
                reason: "transport closed before registration",
            };
        }
        info!(
            device_id,
            connection_id = %connection_id,
            monitoring = flags.monitoring,
            alarm_active = flags.alarm_active,
            "Device connected"
        );
        state.broadcast_device_status();
        EventOutcome::Applied
    }

    fn monitoring_started(&self, state: &mut HubState, device_id: &str) -> EventOutcome {
        if let Some(device) = state.registry.lookup_mut(device_id) {
            device.is_monitoring = true;
            device.phase = device.resting_phase();
        }
        state.samples.start_session(device_id, self.clock.now());
        info!(device_id, "Sleep monitoring started");
        state.broadcast_device_status();
        EventOutcome::Applied
    }

    /// A device that stops monitoring keeps counting down an armed alarm
    fn monitoring_stopped(state: &mut HubState, device_id: &str) -> EventOutcome {
        if let Some(device) = state.registry.lookup_mut(device_id) {
            device.is_monitoring = false;
            device.phase = device.resting_phase();
        }
        info!(device_id, "Sleep monitoring stopped");
        state.broadcast_device_status();
        EventOutcome::Applied
    }

    fn ingest_sleep_data(
        &self,
        state: &mut HubState,
        device_id: &str,
        samples: &[SleepSample],
    ) -> EventOutcome {
        let now = self.clock.now();
        let analysis = self.analyzer.analyze(samples);
        let session = state.samples.append_samples(device_id, samples, now);
        session.last_analysis = Some(analysis.clone());
        debug!(
            device_id,
            batch = samples.len(),
            retained = session.samples.len(),
            stage = ?analysis.stage,
            movement = analysis.movement_level,
            "Sleep data received"
        );

        state.broadcast(&HubEvent::SleepData {
            device_id: device_id.to_owned(),
            analysis,
            timestamp: now,
        });
        EventOutcome::Applied
    }

    /// Arm the device's countdown at the cycle-aligned wake time
    ///
    /// Repeated detections recompute from the latest one and re-send.
    fn sleep_detected(&self, state: &mut HubState, device_id: &str) -> EventOutcome {
        if state.registry.lookup(device_id).is_none() {
            return EventOutcome::Ignored {
                reason: "sleep detected for unregistered device",
            };
        }
        let Some(setting) = state.alarms.get_mut(device_id) else {
            return EventOutcome::Ignored {
                reason: "sleep detected without an alarm setting",
            };
        };

        let now = self.clock.now();
        let computation = self.scheduler.compute(setting.target_wake_time, now);
        let delay_ms = (computation.recommended_time - now)
            .num_milliseconds()
            .max(self.config.min_alarm_delay_ms);
        setting.record_detection(now, &computation, now);
        info!(
            device_id,
            target_wake_time = %setting.target_wake_time,
            recommended_time = %computation.recommended_time,
            cycles_to_target = computation.cycles_to_target,
            delay_ms,
            "Sleep detected, alarm computed"
        );

        let armed = match state
            .registry
            .send_to_device(device_id, &DeviceCommand::SetAlarm { delay_ms })
        {
            Ok(()) => true,
            Err(e) => {
                warn!(device_id, error = %e, "Could not arm device alarm");
                false
            }
        };
        if let Some(device) = state.registry.lookup_mut(device_id) {
            if armed {
                device.alarm_active = true;
                device.phase = DevicePhase::AlarmScheduled;
            } else {
                device.phase = DevicePhase::SleepDetected;
            }
        }
        state.broadcast_device_status();

        state.broadcast(&HubEvent::SleepDetected {
            device_id: device_id.to_owned(),
            sleep_info: SleepInfo {
                sleep_start_time: now,
                recommended_alarm_time: computation.recommended_time,
                cycles_to_target: computation.cycles_to_target,
            },
            timestamp: now,
        });
        EventOutcome::Applied
    }

    fn alarm_triggered(&self, state: &mut HubState, device_id: &str) -> EventOutcome {
        info!(device_id, "Device alarm triggered");

        let dimming = state
            .alarms
            .get(device_id)
            .map(|setting| DeviceCommand::BulbDimming {
                pattern: setting.pattern,
                max_bright: setting.max_bright,
                interval_ms: Some(setting.interval_ms),
            });
        if let Some(command) = dimming {
            if state.registry.is_device_open(device_id) {
                if let Err(e) = state.registry.send_to_device(device_id, &command) {
                    warn!(device_id, error = %e, "Could not start wake-up dimming");
                }
            } else {
                debug!(device_id, "Device transport not open, dimming skipped");
            }
        }

        if let Some(device) = state.registry.lookup_mut(device_id) {
            device.alarm_active = false;
            device.phase = device.resting_phase();
            state.broadcast_device_status();
        }

        state.broadcast(&HubEvent::AlarmTriggered {
            device_id: device_id.to_owned(),
            timestamp: self.clock.now(),
        });
        EventOutcome::Applied
    }

    // ------------------------------------------------------------------
    // Observer requests
    // ------------------------------------------------------------------

    /// Store an alarm and ask the device to start monitoring
    ///
    /// The setting is stored even when the device is not connected; the
    /// response reports whether `start_monitoring` reached it.
    ///
    /// # Errors
    ///
    /// Validation errors for a missing device id or an unparseable wake time.
    pub async fn set_alarm(&self, request: &SetAlarmRequest) -> AppResult<AlarmSetResponse> {
        let device_id = alarm::require_device_id(request.device_id.as_deref())?;
        let target_wake_time = alarm::parse_wake_time(request.target_wake_time.as_ref())?;
        let dimming = DimmingParams::normalize(
            request.pattern.as_ref(),
            request.max_bright.as_ref(),
            request.interval_ms.as_ref(),
            &self.config,
        );
        let now = self.clock.now();

        let mut state = self.state.lock().await;
        state.alarms.insert(
            device_id.to_owned(),
            AlarmSetting::new(target_wake_time, dimming, now),
        );

        // An alarm is meaningless without sleep tracking
        let monitoring_requested = if state.registry.is_device_open(device_id) {
            match state
                .registry
                .send_to_device(device_id, &DeviceCommand::StartMonitoring { timestamp: now })
            {
                Ok(()) => true,
                Err(e) => {
                    warn!(device_id, error = %e, "Could not request monitoring");
                    false
                }
            }
        } else {
            debug!(device_id, "Device not connected, monitoring will start on its own");
            false
        };
        drop(state);

        info!(
            device_id,
            target_wake_time = %target_wake_time,
            pattern = dimming.pattern,
            max_bright = dimming.max_bright,
            interval_ms = dimming.interval_ms,
            monitoring_requested,
            "Alarm set"
        );

        Ok(AlarmSetResponse {
            device_id: device_id.to_owned(),
            target_wake_time,
            pattern: dimming.pattern,
            max_bright: dimming.max_bright,
            interval_ms: dimming.interval_ms,
            monitoring_requested,
        })
    }

    /// Delete a device's alarm, telling the device if it is reachable
    ///
    /// Always succeeds; cancelling an absent alarm is a no-op.
    ///
    /// # Errors
    ///
    /// Only for a missing device id.
    pub async fn cancel_alarm(&self, device_id: &str) -> AppResult<()> {
        let device_id = alarm::require_device_id(Some(device_id))?;
        let now = self.clock.now();

        let mut state = self.state.lock().await;
        if state.registry.is_device_open(device_id) {
            if let Err(e) = state
                .registry
                .send_to_device(device_id, &DeviceCommand::CancelAlarm { timestamp: now })
            {
                warn!(device_id, error = %e, "Could not send cancel_alarm");
            }
        }
        let removed = state.alarms.remove(device_id).is_some();

        if let Some(device) = state.registry.lookup_mut(device_id) {
            device.alarm_active = false;
            device.phase = device.resting_phase();
            state.broadcast_device_status();
        }
        drop(state);

        info!(device_id, removed, "Alarm cancelled");
        Ok(())
    }

    /// Stored alarm of a device
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if the device has no alarm.
    pub async fn get_alarm(&self, device_id: &str) -> AppResult<AlarmSetting> {
        self.state
            .lock()
            .await
            .alarms
            .get(device_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Alarm setting for {device_id}")))
    }

    /// Ask a device to start streaming samples
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn request_start_monitoring(&self, device_id: &str) -> AppResult<()> {
        let timestamp = self.clock.now();
        self.send_command(device_id, &DeviceCommand::StartMonitoring { timestamp })
            .await
    }

    /// Ask a device to stop streaming samples
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn request_stop_monitoring(&self, device_id: &str) -> AppResult<()> {
        let timestamp = self.clock.now();
        self.send_command(device_id, &DeviceCommand::StopMonitoring { timestamp })
            .await
    }

    /// Switch the bulb on or off
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn set_bulb_power(&self, device_id: &str, on: bool) -> AppResult<()> {
        self.send_command(device_id, &DeviceCommand::BulbPower { on })
            .await
    }

    /// Start a dimming pattern outside of any alarm
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn start_dimming(
        &self,
        device_id: &str,
        pattern: u8,
        max_bright: Option<u8>,
        interval_ms: Option<u64>,
    ) -> AppResult<DeviceCommand> {
        let command = DeviceCommand::BulbDimming {
            pattern,
            max_bright: max_bright.unwrap_or(self.config.default_max_bright),
            interval_ms: interval_ms.filter(|ms| *ms > 0),
        };
        self.send_command(device_id, &command).await?;
        Ok(command)
    }

    /// Hold the dimmer at `level` percent
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn set_dimmer_level(&self, device_id: &str, level: u8) -> AppResult<DeviceCommand> {
        let command = DeviceCommand::SetPowerClamped {
            level: level.min(MAX_BRIGHTNESS),
        };
        self.send_command(device_id, &command).await?;
        Ok(command)
    }

    /// Set the light's brightness to `level` percent
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn set_light_brightness(
        &self,
        device_id: &str,
        level: u8,
    ) -> AppResult<DeviceCommand> {
        let command = DeviceCommand::SetBrightness {
            level: level.min(MAX_BRIGHTNESS),
        };
        self.send_command(device_id, &command).await?;
        Ok(command)
    }

    /// Start a sunrise ramp, using configured defaults for absent values
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn start_sunrise(
        &self,
        device_id: &str,
        duration_ms: Option<u64>,
        target_level: Option<u8>,
    ) -> AppResult<DeviceCommand> {
        let command = DeviceCommand::SunriseStart {
            duration_ms: duration_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(self.config.default_sunrise_duration_ms),
            target_level: target_level
                .unwrap_or(self.config.default_sunrise_level)
                .min(MAX_BRIGHTNESS),
        };
        self.send_command(device_id, &command).await?;
        Ok(command)
    }

    /// Abort a running sunrise ramp
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` or `DeviceUnavailable`.
    pub async fn cancel_sunrise(&self, device_id: &str) -> AppResult<()> {
        self.send_command(device_id, &DeviceCommand::SunriseCancel)
            .await
    }

    async fn send_command(&self, device_id: &str, command: &DeviceCommand) -> AppResult<()> {
        let device_id = alarm::require_device_id(Some(device_id))?;
        self.state
            .lock()
            .await
            .registry
            .send_to_device(device_id, command)?;
        info!(device_id, command = command.name(), "Command sent");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every registered device, ordered by id
    pub async fn list_devices(&self) -> Vec<DeviceSummary> {
        self.state.lock().await.registry.devices()
    }

    /// Current session of a device
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if the device has no session.
    pub async fn get_session(&self, device_id: &str) -> AppResult<SleepSession> {
        self.state
            .lock()
            .await
            .samples
            .get(device_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Sleep session for {device_id}")))
    }

    /// Whether a transport currently has the observer role
    pub async fn is_observer(&self, connection_id: ConnectionId) -> bool {
        self.state.lock().await.registry.is_observer(connection_id)
    }

    /// Counts for health reporting
    pub async fn stats(&self) -> HubStats {
        let state = self.state.lock().await;
        HubStats {
            connections: state.registry.connection_count(),
            devices: state.registry.device_count(),
            sessions: state.samples.session_count(),
            alarms: state.alarms.len(),
        }
    }
}

/// Point-in-time counts of hub state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HubStats {
    /// Attached transports
    pub connections: usize,
    /// Registered devices
    pub devices: usize,
    /// Sleep sessions held
    pub sessions: usize,
    /// Alarm settings held
    pub alarms: usize,
}
