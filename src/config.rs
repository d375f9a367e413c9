use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::device::{DEFAULT_CLICK_TIME_MS, DEFAULT_DEBOUNCING_TIME};
use crate::infrared::IR_EDGE_TIMEOUT_US;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub storage: StorageConfig,
    pub infrared: InfraredConfig,
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Load configuration from the default location or create it
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }
}

fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config/fabi"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name shown in logs
    pub name: String,
    /// Button sampling period in milliseconds
    pub tick_interval_ms: u64,
    /// Equal samples needed before a level is accepted
    pub debounce_ticks: u8,
    /// Press duration of a mouse click in milliseconds
    pub click_time_ms: u64,
    /// Period of `AT SR` reports and continuous mouse movement
    pub report_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "FABI".to_string(),
            tick_interval_ms: 1,
            debounce_ticks: DEFAULT_DEBOUNCING_TIME,
            click_time_ms: DEFAULT_CLICK_TIME_MS,
            report_interval_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Slot file; defaults to `slots.json` next to the config file
    pub slot_file: Option<PathBuf>,
    /// Maximum number of stored slots
    pub max_slots: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot_file: None,
            max_slots: 10,
        }
    }
}

impl StorageConfig {
    /// Resolved slot file location
    pub fn slot_path(&self) -> Result<PathBuf> {
        match &self.slot_file {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("slots.json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfraredConfig {
    /// Longest edge-to-edge time while recording, in microseconds
    pub timeout_us: u32,
}

impl Default for InfraredConfig {
    fn default() -> Self {
        Self {
            timeout_us: IR_EDGE_TIMEOUT_US,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Layout used for the factory slot
    pub default_layout: String,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            default_layout: "en_US".to_string(),
        }
    }
}
