// ABOUTME: Constants for sleep cycle alignment and alarm dimming defaults
// ABOUTME: Compiled-in defaults that environment configuration may override
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Constants module
//!
//! Values here are the compiled-in defaults. Anything an operator may want
//! to tune is surfaced again through `AlarmConfig` in the server crate.

/// Sleep cycle physiology
pub mod sleep_cycle {
    /// Length of one sleep cycle in minutes
    pub const CYCLE_MINUTES: i64 = 90;

    /// Length of one sleep cycle in milliseconds
    pub const CYCLE_DURATION_MS: i64 = CYCLE_MINUTES * 60 * 1000;
}

/// Alarm and dimming defaults
pub mod alarm {
    /// Dimming step period floor; anything lower is replaced by the default
    pub const MIN_INTERVAL_MS: u64 = 200;

    /// Dimming step period used when the request omits or undercuts the floor
    pub const DEFAULT_INTERVAL_MS: u64 = 4000;

    /// Smallest `delay_ms` ever sent with a `set_alarm` command
    pub const MIN_ALARM_DELAY_MS: i64 = 1000;

    /// Dimming curve used when none is requested
    pub const DEFAULT_PATTERN: u8 = 1;

    /// Peak brightness percentage used when none is requested
    pub const DEFAULT_MAX_BRIGHT: u8 = 100;

    /// Upper bound of every brightness percentage
    pub const MAX_BRIGHTNESS: u8 = 100;

    /// Sunrise ramp length used when none is requested (15 minutes)
    pub const DEFAULT_SUNRISE_DURATION_MS: u64 = 15 * 60 * 1000;

    /// Sunrise end level used when none is requested
    pub const DEFAULT_SUNRISE_LEVEL: u8 = 100;
}

/// Sample retention
pub mod retention {
    /// Samples kept per session: eight hours at one sample per second
    pub const SESSION_SAMPLE_CAPACITY: usize = 8 * 60 * 60;
}

/// Service identification for structured logs
pub mod service_names {
    /// Name of the hub server binary
    pub const SLEEPHUB_SERVER: &str = "sleephub-server";
}
