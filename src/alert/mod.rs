// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! Alert events and the caller-owned alert log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emergency categories reported by the wearable monitor.
///
/// This is a closed set: every alert the engine can ever produce is one of
/// these four, and dispatch on it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// Device-asserted fall flag (high G-force impact detected on-device)
    FallDetected,
    /// Device-debounced stillness flag held true
    Immobility,
    /// Heart rate sustained outside configured limits
    AbnormalHr,
    /// Emergency button pressed on the device
    ManualSos,
}

impl AlertType {
    /// Human-readable description attached to every emitted event.
    pub fn description(&self) -> &'static str {
        match self {
            AlertType::FallDetected => "Sudden fall detected (High G-Force)",
            AlertType::Immobility => "No movement detected for extended period",
            AlertType::AbnormalHr => "Heart Rate sustained outside safe limits",
            AlertType::ManualSos => "Emergency Button Pressed by User",
        }
    }
}

/// A single emitted emergency alert.
///
/// Events are constructed by the engine with `resolved = false` and never
/// mutated afterwards. No code path flips `resolved`; the field is kept for
/// schema compatibility with downstream consumers (product ambiguity,
/// see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique event id
    pub id: String,
    /// Emergency category
    pub alert_type: AlertType,
    /// Timestamp of the triggering telemetry record
    pub timestamp: DateTime<Utc>,
    /// Human-readable description
    pub description: String,
    /// Always false at emission
    pub resolved: bool,
}

impl AlertEvent {
    /// Build a new unresolved event stamped with the triggering record's
    /// wall-clock milliseconds.
    pub fn new(alert_type: AlertType, timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            alert_type,
            timestamp: DateTime::from_timestamp_millis(timestamp_ms as i64)
                .unwrap_or_else(Utc::now),
            description: alert_type.description().to_string(),
            resolved: false,
        }
    }
}

/// Ordered, append-only collection of emitted alerts.
///
/// Owned by the caller, not the engine: it survives engine resets and is
/// displayed newest-first.
#[derive(Debug, Default, Clone)]
pub struct AlertLog {
    events: Vec<AlertEvent>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an emitted event in arrival order.
    pub fn record(&mut self, event: AlertEvent) {
        self.events.push(event);
    }

    /// Events in display order (newest first).
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter().rev()
    }

    /// Most recently recorded event.
    pub fn latest(&self) -> Option<&AlertEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events of one category.
    pub fn count_of(&self, alert_type: AlertType) -> usize {
        self.events.iter().filter(|e| e.alert_type == alert_type).count()
    }
}
