// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::transport::MqttSettings;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Telemetry history length kept for display
    pub history_size: usize,

    /// Device detection thresholds
    pub device: SystemConfig,

    /// MQTT transport settings
    pub mqtt: MqttSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "BioSafe Guard".to_string(),
            log_level: "info".to_string(),
            history_size: crate::telemetry::MAX_HISTORY,
            device: SystemConfig::default(),
            mqtt: MqttSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("biosafe-guard"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Device detection thresholds, mutated by the operator and read-only to
/// the detection engine.
///
/// `fall_threshold_g` and `immobility_time_sec` are informational at this
/// layer: thresholding on raw acceleration and stillness debouncing both
/// happen on the device, which reports the resulting booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Bradycardia threshold in BPM
    pub min_heart_rate: u32,

    /// Tachycardia threshold in BPM
    pub max_heart_rate: u32,

    /// Device-side fall impact threshold in G
    pub fall_threshold_g: f64,

    /// Device-side stillness debounce in seconds
    pub immobility_time_sec: u32,

    /// Telemetry publish rate in Hz
    pub sensor_frequency_hz: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            min_heart_rate: 40,
            max_heart_rate: 120,
            fall_threshold_g: 2.0,
            immobility_time_sec: 10,
            sensor_frequency_hz: 1,
        }
    }
}

impl SystemConfig {
    /// Reject settings the device cannot operate with. Bounds match the
    /// ranges the operator form exposes.
    pub fn validate(&self) -> Result<()> {
        if !(30..=90).contains(&self.min_heart_rate) {
            return Err(anyhow!(
                "min heart rate {} outside supported range 30-90 BPM",
                self.min_heart_rate
            ));
        }
        if !(90..=200).contains(&self.max_heart_rate) {
            return Err(anyhow!(
                "max heart rate {} outside supported range 90-200 BPM",
                self.max_heart_rate
            ));
        }
        if self.min_heart_rate >= self.max_heart_rate {
            return Err(anyhow!(
                "min heart rate {} must be below max heart rate {}",
                self.min_heart_rate,
                self.max_heart_rate
            ));
        }
        if !(0.1..=10.0).contains(&self.fall_threshold_g) {
            return Err(anyhow!(
                "fall threshold {} G outside supported range 0.1-10.0",
                self.fall_threshold_g
            ));
        }
        if self.sensor_frequency_hz == 0 {
            return Err(anyhow!("sensor frequency must be at least 1 Hz"));
        }
        Ok(())
    }
}

/// The JSON payload published back to the device on the config topic.
/// Field names are the device contract and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfigPayload {
    pub min_hr: u32,
    pub max_hr: u32,
    pub fall_g: f64,
    pub immobility_sec: u32,
    pub frequency_hz: u32,
}

impl From<&SystemConfig> for DeviceConfigPayload {
    fn from(config: &SystemConfig) -> Self {
        Self {
            min_hr: config.min_heart_rate,
            max_hr: config.max_heart_rate,
            fall_g: config.fall_threshold_g,
            immobility_sec: config.immobility_time_sec,
            frequency_hz: config.sensor_frequency_hz,
        }
    }
}
