// ABOUTME: Environment-based configuration for the hub's network surface and alarm tunables
// ABOUTME: Parses HTTP_PORT, HOST, ENVIRONMENT and the ALARM_* / SESSION_* overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! Environment configuration
//!
//! The hub reads its configuration from environment variables only; there
//! are no config files. Unset variables take the documented defaults, set
//! but unparseable variables are a startup error.

use anyhow::{Context, Result};
use sleephub_core::constants::{alarm, retention};
use sleephub_core::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default listen address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational (default)
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Tunables of the session orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmConfig {
    /// Floor for the dimming step period; smaller values are replaced by the default
    pub min_interval_ms: u64,
    /// Dimming step period used when none (or an invalid one) is supplied
    pub default_interval_ms: u64,
    /// Smallest `delay_ms` ever sent in a `set_alarm` command
    pub min_alarm_delay_ms: i64,
    /// Dimming pattern used when none is supplied
    pub default_pattern: u8,
    /// Peak brightness used when none is supplied
    pub default_max_bright: u8,
    /// Samples retained per session; oldest are trimmed first
    pub session_sample_capacity: usize,
    /// Sunrise ramp length used when none is supplied
    pub default_sunrise_duration_ms: u64,
    /// Sunrise end brightness used when none is supplied
    pub default_sunrise_level: u8,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: alarm::MIN_INTERVAL_MS,
            default_interval_ms: alarm::DEFAULT_INTERVAL_MS,
            min_alarm_delay_ms: alarm::MIN_ALARM_DELAY_MS,
            default_pattern: alarm::DEFAULT_PATTERN,
            default_max_bright: alarm::DEFAULT_MAX_BRIGHT,
            session_sample_capacity: retention::SESSION_SAMPLE_CAPACITY,
            default_sunrise_duration_ms: alarm::DEFAULT_SUNRISE_DURATION_MS,
            default_sunrise_level: alarm::DEFAULT_SUNRISE_LEVEL,
        }
    }
}

impl AlarmConfig {
    /// Load alarm tunables from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            min_interval_ms: env_parse_or("ALARM_MIN_INTERVAL_MS", defaults.min_interval_ms)?,
            default_interval_ms: env_parse_or(
                "ALARM_DEFAULT_INTERVAL_MS",
                defaults.default_interval_ms,
            )?,
            min_alarm_delay_ms: env_parse_or(
                "ALARM_MIN_DELAY_MS",
                defaults.min_alarm_delay_ms,
            )?,
            default_pattern: env_parse_or("ALARM_DEFAULT_PATTERN", defaults.default_pattern)?,
            default_max_bright: env_parse_or(
                "ALARM_DEFAULT_MAX_BRIGHT",
                defaults.default_max_bright,
            )?,
            session_sample_capacity: env_parse_or(
                "SESSION_SAMPLE_CAPACITY",
                defaults.session_sample_capacity,
            )?,
            default_sunrise_duration_ms: env_parse_or(
                "SUNRISE_DEFAULT_DURATION_MS",
                defaults.default_sunrise_duration_ms,
            )?,
            default_sunrise_level: env_parse_or(
                "SUNRISE_DEFAULT_LEVEL",
                defaults.default_sunrise_level,
            )?,
        })
    }

    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first inconsistent value
    pub fn validate(&self) -> AppResult<()> {
        if self.default_interval_ms < self.min_interval_ms {
            return Err(AppError::config(format!(
                "default interval {}ms is below the {}ms floor",
                self.default_interval_ms, self.min_interval_ms
            )));
        }
        if self.default_pattern == 0 {
            return Err(AppError::config("default dimming pattern must be positive"));
        }
        if self.default_max_bright > alarm::MAX_BRIGHTNESS
            || self.default_sunrise_level > alarm::MAX_BRIGHTNESS
        {
            return Err(AppError::config(format!(
                "brightness defaults must not exceed {}",
                alarm::MAX_BRIGHTNESS
            )));
        }
        if self.min_alarm_delay_ms < 0 {
            return Err(AppError::config("minimum alarm delay must not be negative"));
        }
        if self.session_sample_capacity == 0 {
            return Err(AppError::config("session sample capacity must be positive"));
        }
        Ok(())
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub host: String,
    /// HTTP and WebSocket listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Comma-separated CORS origins, `*` for any
    pub cors_allowed_origins: String,
    /// Orchestrator tunables
    pub alarm: AlarmConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            http_port: DEFAULT_HTTP_PORT,
            environment: Environment::default(),
            log_level: LogLevel::default(),
            cors_allowed_origins: "*".to_owned(),
            alarm: AlarmConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value or the
    /// resulting configuration is inconsistent
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned()),
            http_port: env_parse_or("HTTP_PORT", DEFAULT_HTTP_PORT)?,
            environment: Environment::from_str_or_default(
                &env::var("ENVIRONMENT").unwrap_or_default(),
            ),
            log_level: LogLevel::from_str_or_default(
                &env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()),
            ),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_owned()),
            alarm: AlarmConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any section is inconsistent
    pub fn validate(&self) -> AppResult<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::config("HOST must not be empty"));
        }
        self.alarm.validate()
    }

    /// Socket address string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// Human-readable summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Sleephub Server Configuration:\n\
             - Listen: {}:{}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Dimming Interval: {}ms (floor {}ms)\n\
             - Minimum Alarm Delay: {}ms\n\
             - Session Capacity: {} samples",
            self.host,
            self.http_port,
            self.environment,
            self.log_level,
            self.alarm.default_interval_ms,
            self.alarm.min_interval_ms,
            self.alarm.min_alarm_delay_ms,
            self.alarm.session_sample_capacity,
        )
    }
}

fn env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}
