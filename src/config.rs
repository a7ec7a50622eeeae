use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "spacebar";

/// Options read by the run tracker on every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Number of spacebar messages before a run counts as started
    #[serde(default = "default_min_run_start")]
    pub min_run_start: u32,
    /// Raise a notification when a run starts
    #[serde(default = "default_true")]
    pub notify_on_start: bool,
    /// Allow a single sender to contribute several messages to one run
    #[serde(default)]
    pub duplicates_allowed: bool,
}

fn default_min_run_start() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_run_start: default_min_run_start(),
            notify_on_start: true,
            duplicates_allowed: false,
        }
    }
}

impl TrackerConfig {
    /// Threshold with the `>= 1` floor applied.
    pub fn run_start_threshold(&self) -> u32 {
        self.min_run_start.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_directory")]
    pub log_directory: String,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_log_directory() -> String {
    dirs::home_dir()
        .map(|home| home.join(".spacebar").join("chatlogs"))
        .unwrap_or_else(|| "chatlogs".into())
        .to_string_lossy()
        .into_owned()
}

impl ::std::default::Default for AppConfig {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    /// Load the stored configuration, falling back to defaults.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self).map_err(ConfigError::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.min_run_start, 3);
        assert!(config.notify_on_start);
        assert!(!config.duplicates_allowed);
    }

    #[test]
    fn test_threshold_floor() {
        let config = TrackerConfig {
            min_run_start: 0,
            ..Default::default()
        };
        assert_eq!(config.run_start_threshold(), 1);

        let config = TrackerConfig {
            min_run_start: 5,
            ..Default::default()
        };
        assert_eq!(config.run_start_threshold(), 5);
    }
}
