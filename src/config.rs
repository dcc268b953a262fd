//! # Scheduler configuration.
//!
//! Provides [`Config`], the settings consumed by the restart scheduler and the
//! telemetry bridge, and its TOML file form.
//!
//! ## File format
//! ```toml
//! restart_interval_minutes = 240
//! progress_log_steps_per_round = 5
//! poll_interval_ms = 1000
//! grace_secs = 60
//! bus_capacity = 1024
//! ```
//! Every key is optional; missing keys keep their [`Default`] value.
//!
//! ## Sentinel values
//! - `grace = 0s` → on shutdown, do not wait for the running round

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Runtime configuration for the restart scheduler.
///
/// ## Field semantics
/// - `restart_interval`: period between engine restarts
/// - `progress_log_steps_per_round`: max progress lines per round (min 1)
/// - `poll_interval`: drain-wait poll period (completion signal wakes earlier)
/// - `grace`: max wait for the running round when the scheduler is cancelled
/// - `bus_capacity`: per-generation event bus ring buffer size (min 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Period between restarts. The first engine starts immediately.
    pub restart_interval: Duration,

    /// Upper bound on progress lines per round.
    pub progress_log_steps_per_round: u32,

    /// Poll period of the drain wait.
    pub poll_interval: Duration,

    /// Shutdown grace for the final drain.
    pub grace: Duration,

    /// Capacity of each generation's event bus.
    ///
    /// Slow dispatchers that lag behind more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Restart interval as printed in log lines: `240min`, or the exact
    /// duration (`90s`, `1.5s`) when it is not a whole number of minutes.
    pub fn restart_interval_label(&self) -> String {
        let d = self.restart_interval;
        if d.subsec_nanos() == 0 && d.as_secs() % 60 == 0 {
            format!("{}min", d.as_secs() / 60)
        } else {
            format!("{d:?}")
        }
    }

    /// Rejects values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restart_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "restart_interval",
                reason: "must be greater than zero",
            });
        }
        if self.progress_log_steps_per_round == 0 {
            return Err(ConfigError::Invalid {
                field: "progress_log_steps_per_round",
                reason: "must be at least 1",
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "poll_interval",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(s)?;
        let cfg = file.into_config();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `restart_interval = 240min`
    /// - `progress_log_steps_per_round = 5`
    /// - `poll_interval = 1s`
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            restart_interval: Duration::from_secs(240 * 60),
            progress_log_steps_per_round: 5,
            poll_interval: Duration::from_secs(1),
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
        }
    }
}

/// On-disk form of [`Config`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub restart_interval_minutes: Option<u64>,
    pub progress_log_steps_per_round: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub grace_secs: Option<u64>,
    pub bus_capacity: Option<usize>,
}

impl FileConfig {
    /// Overlays the file values on top of [`Config::default`].
    pub fn into_config(self) -> Config {
        let d = Config::default();
        Config {
            restart_interval: self
                .restart_interval_minutes
                .map(|m| Duration::from_secs(m.saturating_mul(60)))
                .unwrap_or(d.restart_interval),
            progress_log_steps_per_round: self
                .progress_log_steps_per_round
                .unwrap_or(d.progress_log_steps_per_round),
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(d.poll_interval),
            grace: self.grace_secs.map(Duration::from_secs).unwrap_or(d.grace),
            bus_capacity: self.bus_capacity.unwrap_or(d.bus_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.restart_interval_label(), "240min");
    }

    #[test]
    fn test_sub_minute_interval_label() {
        let mut cfg = Config::default();
        cfg.restart_interval = Duration::from_secs(10);
        assert_eq!(cfg.restart_interval_label(), "10s");
        cfg.restart_interval = Duration::from_secs(90);
        assert_eq!(cfg.restart_interval_label(), "90s");
        cfg.restart_interval = Duration::from_secs(120);
        assert_eq!(cfg.restart_interval_label(), "2min");
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_file_overrides() {
        let cfg = Config::from_toml_str(
            "restart_interval_minutes = 30\nprogress_log_steps_per_round = 10\npoll_interval_ms = 250\n",
        )
        .unwrap();
        assert_eq!(cfg.restart_interval, Duration::from_secs(1800));
        assert_eq!(cfg.progress_log_steps_per_round, 10);
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.grace, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = Config::from_toml_str("progress_log_steps_per_round = 0").unwrap_err();
        assert_eq!(err.as_label(), "config_invalid");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_toml_str("restart_interval_minutes = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "restart_interval",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("restartInterval = 5").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.as_label(), "config_read");
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
