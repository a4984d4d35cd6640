//! Process settings
//!
//! Handles TOML settings file parsing and CLI argument merging. The alert
//! rules themselves live in the configuration store, not here.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::DispatcherConfig;
use crate::control::DEFAULT_PREFIX;
use crate::error::SettingsError;
use crate::services::{EvaluatorConfig, MonitorConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// General settings
    pub general: GeneralConfig,
    /// Configuration store location
    pub store: StoreConfig,
    /// Marker directories
    pub paths: PathsConfig,
    /// Alerting policy and execution
    pub alerts: AlertsConfig,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Log alert commands instead of running them
    pub dry_run: bool,
    /// Tick interval in seconds
    pub interval_secs: u64,
    /// Tick on the GCD of thresholds (never slower than `interval_secs`)
    pub interval_from_thresholds: bool,
    /// Evaluate rules against UTC instead of local time
    pub utc: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            dry_run: false,
            interval_secs: 5,
            interval_from_thresholds: false,
            utc: false,
        }
    }
}

/// Configuration store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one file per record key
    pub dir: PathBuf,
    /// Key of the alert configuration record
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/tqalert"),
            key: "tqconf".to_string(),
        }
    }
}

/// Marker locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory polled for mute, test-fire and reload markers
    pub control_dir: PathBuf,
    /// Filename prefix of control markers
    pub control_prefix: String,
    /// Directory of `<SYMBOL>.LastT` / `<SYMBOL>.LastQ` activity markers
    pub marker_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            control_dir: PathBuf::from("/tmp/TQAlert"),
            control_prefix: DEFAULT_PREFIX.to_string(),
            marker_dir: PathBuf::from("/tmp/lastTQ"),
        }
    }
}

/// Alerting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Minimum seconds between two alerts for the same symbol
    pub min_alert_interval_secs: u64,
    /// Re-fire a persisting breach every N seconds
    pub realert_interval_secs: Option<u64>,
    /// Seconds after start before absent markers are reported
    pub startup_grace_secs: u64,
    /// Wait one threshold after a window opens before checking a kind
    pub open_grace: bool,
    /// Mute duration in hours
    pub mute_hours: u64,
    /// Worker threads running alert commands
    pub workers: usize,
    /// Pending alert commands before new ones are dropped
    pub queue_capacity: usize,
    /// Seconds before a running alert command is killed
    pub command_timeout_secs: u64,
    /// Shell used to run alert commands
    pub shell: PathBuf,
    /// Seconds to wait for alert commands on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            min_alert_interval_secs: 30,
            realert_interval_secs: None,
            startup_grace_secs: 0,
            open_grace: true,
            mute_hours: 24,
            workers: 2,
            queue_capacity: 64,
            command_timeout_secs: 60,
            shell: PathBuf::from("/bin/sh"),
            shutdown_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |key: &str, message: &str| {
            Err(SettingsError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.general.interval_secs == 0 {
            return invalid("general.interval_secs", "must be at least 1");
        }
        if self.store.key.trim().is_empty() {
            return invalid("store.key", "must not be empty");
        }
        if self.paths.control_prefix.is_empty() || self.paths.control_prefix.contains('/') {
            return invalid("paths.control_prefix", "must be a non-empty file name prefix");
        }
        if self.alerts.workers == 0 {
            return invalid("alerts.workers", "must be at least 1");
        }
        if self.alerts.queue_capacity == 0 {
            return invalid("alerts.queue_capacity", "must be at least 1");
        }
        if self.alerts.mute_hours == 0 {
            return invalid("alerts.mute_hours", "must be at least 1");
        }
        if self.alerts.realert_interval_secs == Some(0) {
            return invalid("alerts.realert_interval_secs", "must be at least 1 when set");
        }
        Ok(())
    }

    /// Mute duration in seconds
    pub fn mute_secs(&self) -> i64 {
        self.alerts.mute_hours.saturating_mul(3600) as i64
    }

    /// Monitor configuration derived from these settings
    pub fn monitor_config(&self, single_use: bool) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_secs(self.general.interval_secs),
            interval_from_thresholds: self.general.interval_from_thresholds,
            single_use,
            utc: self.general.utc,
            record_key: self.store.key.clone(),
            evaluator: EvaluatorConfig {
                open_grace: self.alerts.open_grace,
                startup_grace_secs: self.alerts.startup_grace_secs,
                realert_interval_secs: self.alerts.realert_interval_secs,
                min_alert_interval_secs: self.alerts.min_alert_interval_secs,
            },
        }
    }

    /// Default log level; the daemon logs every alert at info
    pub fn log_level(&self, daemon: bool) -> log::LevelFilter {
        log_level(self.general.verbose, daemon)
    }

    /// Dispatcher pool configuration
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            workers: self.alerts.workers,
            queue_capacity: self.alerts.queue_capacity,
            shutdown_timeout: Duration::from_secs(self.alerts.shutdown_timeout_secs),
        }
    }
}

/// Default log level for a verbose flag and command kind
pub fn log_level(verbose: bool, daemon: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else if daemon {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    }
}
