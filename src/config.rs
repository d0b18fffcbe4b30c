//! Configuration for the lottery ledger.
//!
//! Defaults, TOML file loading, `TOMBOLA_*` environment overrides and
//! validation. Protocol constants the ledger fixes (the fee divisor and the
//! bonus grace period) are not configuration; only embedder-tunable knobs
//! live here.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub timing: TimingConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Epochs a lottery stays open when the creator does not specify.
    pub default_duration_epochs: u64,
    /// Wall-clock length of one epoch for the system clock.
    pub epoch_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity for the event bus.
    pub channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            default_duration_epochs: 15,
            epoch_interval_secs: 60,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Configuration loader with environment variable support.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables.
    pub fn load(&self) -> Result<LedgerConfig, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            LedgerConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<LedgerConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut LedgerConfig) -> Result<(), ConfigError> {
        if let Ok(duration) = env::var("TOMBOLA_DEFAULT_DURATION_EPOCHS") {
            config.timing.default_duration_epochs =
                duration.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "TOMBOLA_DEFAULT_DURATION_EPOCHS".to_string(),
                    value: duration,
                    reason: "not a valid epoch count".to_string(),
                })?;
        }
        if let Ok(interval) = env::var("TOMBOLA_EPOCH_INTERVAL_SECS") {
            config.timing.epoch_interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "TOMBOLA_EPOCH_INTERVAL_SECS".to_string(),
                    value: interval,
                    reason: "not a valid interval".to_string(),
                })?;
        }
        if let Ok(capacity) = env::var("TOMBOLA_EVENT_CAPACITY") {
            config.events.channel_capacity =
                capacity.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "TOMBOLA_EVENT_CAPACITY".to_string(),
                    value: capacity,
                    reason: "not a valid capacity".to_string(),
                })?;
        }

        Ok(())
    }

    fn validate(&self, config: &LedgerConfig) -> Result<(), ConfigError> {
        if config.timing.default_duration_epochs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.default_duration_epochs".to_string(),
                value: "0".to_string(),
                reason: "lotteries must stay open for at least one epoch".to_string(),
            });
        }

        if config.timing.epoch_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.epoch_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "epoch interval cannot be zero".to_string(),
            });
        }

        if config.events.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "events.channel_capacity".to_string(),
                value: "0".to_string(),
                reason: "event channel capacity cannot be zero".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &LedgerConfig, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to write {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for programmatic configuration.
pub struct ConfigBuilder {
    config: LedgerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LedgerConfig::default(),
        }
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    pub fn events(mut self, events: EventsConfig) -> Self {
        self.config.events = events;
        self
    }

    pub fn build(self) -> LedgerConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Tests that go through `load()` observe process-global environment
    // variables; serialize them so overrides never leak across cases.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.timing.default_duration_epochs, 15);
        assert_eq!(config.timing.epoch_interval_secs, 60);
        assert_eq!(config.events.channel_capacity, 1024);
    }

    #[test]
    fn test_config_validation() {
        let loader = ConfigLoader::new();
        let mut config = LedgerConfig::default();
        assert!(loader.validate(&config).is_ok());

        config.timing.default_duration_epochs = 0;
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .timing(TimingConfig {
                default_duration_epochs: 30,
                epoch_interval_secs: 10,
            })
            .build();

        assert_eq!(config.timing.default_duration_epochs, 30);
        assert_eq!(config.timing.epoch_interval_secs, 10);
        assert_eq!(config.events.channel_capacity, 1024);
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("TOMBOLA_DEFAULT_DURATION_EPOCHS", "42");
        env::set_var("TOMBOLA_EVENT_CAPACITY", "8");

        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.timing.default_duration_epochs, 42);
        assert_eq!(config.events.channel_capacity, 8);
        // Untouched fields keep their defaults.
        assert_eq!(config.timing.epoch_interval_secs, 60);

        env::set_var("TOMBOLA_DEFAULT_DURATION_EPOCHS", "not-a-number");
        let err = ConfigLoader::new().load().unwrap_err();
        match err {
            ConfigError::InvalidValue { field, value, .. } => {
                assert_eq!(field, "TOMBOLA_DEFAULT_DURATION_EPOCHS");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }

        env::remove_var("TOMBOLA_DEFAULT_DURATION_EPOCHS");
        env::remove_var("TOMBOLA_EVENT_CAPACITY");
    }

    #[test]
    fn test_save_and_load_config() -> Result<(), ConfigError> {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = LedgerConfig {
            timing: TimingConfig {
                default_duration_epochs: 7,
                epoch_interval_secs: 30,
            },
            events: EventsConfig {
                channel_capacity: 64,
            },
        };

        let loader = ConfigLoader::new();
        loader.save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load()?;
        assert_eq!(loaded, original);

        Ok(())
    }
}
