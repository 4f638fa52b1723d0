// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! BioSafe Guard - Wearable Biomedical Safety Monitoring
//!
//! Turns the periodic telemetry stream of a wearable biomedical sensor
//! (heart rate, SpO2, temperature, accel/gyro, fall/stillness/SOS flags)
//! into a small, bounded set of emergency alerts, suppressing noise from
//! sensor warm-up, transient spikes, and duplicate triggers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      BioSafe Guard                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────┐   ┌─────────┐   ┌──────────────┐   ┌──────────┐  │
//! │  │ MQTT   │ → │ Decoder │ → │ Alert Engine │ → │ Alert    │  │
//! │  │ Source │   │         │   │ gates+latch  │   │ Log      │  │
//! │  └────────┘   └─────────┘   └──────────────┘   └──────────┘  │
//! │                    ↓                ↓                        │
//! │               ┌─────────┐   ┌──────────────┐                 │
//! │               │ History │   │  broadcast   │                 │
//! │               │ Buffer  │   │  subscribers │                 │
//! │               └─────────┘   └──────────────┘                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine ([`AlertEngine`]) is synchronous and single-writer: each
//! record is fully evaluated before the next, and all time comes from the
//! records themselves. The async pieces ([`Monitor`], [`MqttSource`]) are
//! plumbing around it.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod alert;
pub mod config;
pub mod engine;
pub mod runtime;
pub mod telemetry;
pub mod transport;

// Re-exports for convenience
pub use alert::{AlertEvent, AlertLog, AlertType};
pub use config::{Config, DeviceConfigPayload, SystemConfig};
pub use engine::{AlertEngine, EngineState};
pub use runtime::{ChannelSource, Monitor, RecordSource, SourceEvent};
pub use telemetry::{decode, DecodeError, HistoryBuffer, TelemetryRecord, Vector3};
pub use transport::{MqttSettings, MqttSource};

/// BioSafe Guard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// BioSafe Guard name
pub const NAME: &str = "BioSafe Guard";
