//! Configuration section types.
//!
//! Every section rejects unknown fields and falls back to defaults for
//! missing ones.

use galley_core::PoolSettings;
use galley_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Application identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name, attached to startup logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Deployment environment (development, staging, production).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_environment(),
        }
    }
}

fn default_app_name() -> String {
    "galley".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Dispatch context pool sizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Contexts allocated when the service is built.
    #[serde(default)]
    pub prewarm: usize,

    /// Idle contexts kept; extra contexts are dropped on release.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            prewarm: 0,
            max_idle: default_max_idle(),
        }
    }
}

fn default_max_idle() -> usize {
    1024
}

impl PoolConfig {
    /// Converts to the pool's own settings type.
    #[must_use]
    pub fn settings(&self) -> PoolSettings {
        PoolSettings {
            prewarm: self.prewarm,
            max_idle: self.max_idle,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, or `target=level` lists).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Converts to the subscriber configuration used by `galley-telemetry`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: false,
            include_location: self.include_location,
            ansi: self.ansi_enabled,
        }
    }
}
