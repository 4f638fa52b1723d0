// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! Telemetry records and the wire decoder

mod history;

pub use history::{HistoryBuffer, MAX_HISTORY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Three-axis sample (accelerometer in G, gyroscope in rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One validated telemetry sample from the wearable.
///
/// Immutable once decoded. `heart_rate` of 0.0 means the pulse sensor is
/// disconnected, not a measurement. Records are stamped with their arrival
/// time; the device's own uptime stamp on the wire is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Arrival timestamp, wall-clock milliseconds
    pub timestamp_ms: u64,
    /// Heart rate in BPM (0.0 = sensor disconnected)
    pub heart_rate: f64,
    /// Blood oxygen saturation in %
    pub spo2: f64,
    /// Body temperature in °C
    pub temperature: f64,
    /// Acceleration vector
    pub accel: Vector3,
    /// Angular rate vector
    pub gyro: Vector3,
    /// Acceleration magnitude in G, computed on-device
    pub accel_mag: f64,
    /// Device-asserted fall flag
    pub fall: bool,
    /// Device-debounced stillness flag
    pub still: bool,
    /// Emergency button state
    pub button_pressed: bool,
    /// Device-side heart-rate alarm (absent on older firmware)
    pub hr_alert: bool,
}

/// Decoding failure. The offending payload is dropped and no state anywhere
/// changes; this is a data-quality event, never fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed telemetry payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wire schema published by the embedded firmware (one JSON object per
/// message). Field names are the device contract and must not change.
#[derive(Debug, Deserialize)]
struct RawTelemetry {
    hr: f64,
    spo2: f64,
    temp: f64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
    gyro_x: f64,
    gyro_y: f64,
    gyro_z: f64,
    accel_mag: f64,
    fall: bool,
    still: bool,
    button_pressed: bool,
    // Optional since older firmware revisions omit it
    #[serde(default)]
    hr_alert: bool,
}

/// Decode one raw payload into a [`TelemetryRecord`] stamped with its
/// arrival time. Pure: no state is read or written.
pub fn decode(payload: &[u8], received_at_ms: u64) -> Result<TelemetryRecord, DecodeError> {
    let raw: RawTelemetry = serde_json::from_slice(payload)?;

    Ok(TelemetryRecord {
        timestamp_ms: received_at_ms,
        heart_rate: raw.hr,
        spo2: raw.spo2,
        temperature: raw.temp,
        accel: Vector3 {
            x: raw.accel_x,
            y: raw.accel_y,
            z: raw.accel_z,
        },
        gyro: Vector3 {
            x: raw.gyro_x,
            y: raw.gyro_y,
            z: raw.gyro_z,
        },
        accel_mag: raw.accel_mag,
        fall: raw.fall,
        still: raw.still,
        button_pressed: raw.button_pressed,
        hr_alert: raw.hr_alert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(hr: &str, extra: &str) -> String {
        format!(
            concat!(
                "{{\"hr\":{hr},\"spo2\":97.5,\"temp\":36.6,",
                "\"accel_x\":0.01,\"accel_y\":-0.02,\"accel_z\":0.98,",
                "\"gyro_x\":0.0,\"gyro_y\":0.0,\"gyro_z\":0.1,",
                "\"accel_mag\":1.01,\"fall\":false,\"still\":false,",
                "\"button_pressed\":false{extra}}}"
            ),
            hr = hr,
            extra = extra,
        )
    }

    #[test]
    fn test_decode_full_payload() {
        let record = decode(payload("72.0", ",\"hr_alert\":true").as_bytes(), 1_234).unwrap();
        assert_eq!(record.timestamp_ms, 1_234);
        assert_eq!(record.heart_rate, 72.0);
        assert_eq!(record.spo2, 97.5);
        assert_eq!(record.accel.z, 0.98);
        assert_eq!(record.gyro.z, 0.1);
        assert!(record.hr_alert);
        assert!(!record.fall);
    }

    #[test]
    fn test_missing_hr_alert_defaults_false() {
        let record = decode(payload("72.0", "").as_bytes(), 0).unwrap();
        assert!(!record.hr_alert);
    }

    #[test]
    fn test_device_uptime_stamp_ignored() {
        // Older and newer firmware alike may include extra fields like "ts"
        let record = decode(payload("60.0", ",\"ts\":99999").as_bytes(), 5_000).unwrap();
        assert_eq!(record.timestamp_ms, 5_000);
    }

    #[test]
    fn test_non_numeric_hr_is_error() {
        assert!(decode(payload("\"fast\"", "").as_bytes(), 0).is_err());
    }

    #[test]
    fn test_missing_required_field_is_error() {
        let json = "{\"hr\":72.0,\"spo2\":97.5}";
        assert!(decode(json.as_bytes(), 0).is_err());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(decode(b"not json at all", 0).is_err());
    }
}
