//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which device the client talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Page location the client pretends to be served from. A `host` query
    /// parameter on it redirects the session to another origin.
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
        }
    }
}

fn default_location() -> String {
    "http://espurna.local/".to_string()
}

/// Session timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,
}

impl SessionConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: default_keepalive_interval_ms(),
            reload_delay_ms: default_reload_delay_ms(),
        }
    }
}

fn default_keepalive_interval_ms() -> u64 {
    5000
}

fn default_reload_delay_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "~/.devlink/debug".to_string()
}
