// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! MQTT record source

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::MqttSettings;
use crate::config::DeviceConfigPayload;
use crate::runtime::{RecordSource, SourceEvent};
use crate::telemetry;

/// Record source backed by an MQTT subscription to the device's data topic.
///
/// rumqttc reconnects on its own; every reconnect after the first is
/// surfaced to the monitor as [`SourceEvent::NewSession`] so detection
/// state never leaks across connections.
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    settings: MqttSettings,
    connected_once: bool,
}

impl MqttSource {
    pub fn connect(settings: &MqttSettings) -> Result<Self> {
        let client_id = format!(
            "{}-{}",
            settings.client_id,
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let mut options = MqttOptions::new(client_id, &settings.broker, settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        options.set_clean_session(true);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, 100);
        info!("MQTT source created for {}:{}", settings.broker, settings.port);

        Ok(Self {
            client,
            eventloop,
            settings: settings.clone(),
            connected_once: false,
        })
    }

    /// Publish the device config payload on the config topic, retained, so
    /// the device receives the last value whenever it (re)connects.
    pub async fn publish_config(&self, payload: &DeviceConfigPayload) -> Result<()> {
        let json = serde_json::to_vec(payload)?;
        self.client
            .publish(&self.settings.config_topic, QoS::AtLeastOnce, true, json)
            .await
            .map_err(|e| anyhow!("MQTT publish failed: {}", e))?;
        info!("Published retained config to {}", self.settings.config_topic);
        Ok(())
    }
}

#[async_trait]
impl RecordSource for MqttSource {
    async fn next_event(&mut self) -> Result<SourceEvent> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("MQTT connected, subscribing to {}", self.settings.data_topic);
                    self.client
                        .subscribe(&self.settings.data_topic, QoS::AtLeastOnce)
                        .await
                        .map_err(|e| anyhow!("MQTT subscribe failed: {}", e))?;

                    if self.connected_once {
                        return Ok(SourceEvent::NewSession);
                    }
                    self.connected_once = true;
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    if msg.topic != self.settings.data_topic {
                        continue;
                    }
                    let now_ms = Utc::now().timestamp_millis() as u64;
                    match telemetry::decode(&msg.payload, now_ms) {
                        Ok(record) => return Ok(SourceEvent::Record(record)),
                        // A malformed payload is a data-quality event, not a
                        // transport fault: drop it and keep polling
                        Err(e) => warn!("Dropping telemetry payload: {}", e),
                    }
                }
                Ok(event) => {
                    debug!("MQTT event: {:?}", event);
                }
                Err(e) => {
                    warn!("MQTT error: {:?}", e);
                    tokio::time::sleep(Duration::from_millis(
                        self.settings.reconnect_interval_ms,
                    ))
                    .await;
                }
            }
        }
    }
}
