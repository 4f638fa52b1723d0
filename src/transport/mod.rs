// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! Transport layer - MQTT record source and config publisher

mod mqtt;

pub use mqtt::MqttSource;

use serde::{Deserialize, Serialize};

/// Default topic the device publishes telemetry on.
pub const DEFAULT_DATA_TOPIC: &str = "saglik/sensor_verileri";

/// Default topic the dashboard publishes retained config on.
pub const DEFAULT_CONFIG_TOPIC: &str = "saglik/config";

/// MQTT transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    /// Base client id; a random suffix is appended per connection
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub data_topic: String,
    pub config_topic: String,
    pub keep_alive_secs: u64,
    pub reconnect_interval_ms: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "biosafe-guard".to_string(),
            username: None,
            password: None,
            data_topic: DEFAULT_DATA_TOPIC.to_string(),
            config_topic: DEFAULT_CONFIG_TOPIC.to_string(),
            keep_alive_secs: 30,
            reconnect_interval_ms: 5_000,
        }
    }
}
