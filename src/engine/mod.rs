//! Emergency detection engine
//!
//! The sole producer of [`AlertEvent`]s. Evaluates one telemetry record at
//! a time, synchronously, against a warm-up gate, a fall cooldown, a
//! heart-rate sustain timer, and a rising-edge latch bank. All time comes
//! from the records themselves; the engine never reads a clock.

mod gates;
mod latch;

pub use gates::{CooldownGate, SustainState, SustainTimer, WarmupGate};
pub use latch::LatchBank;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertEvent, AlertType};
use crate::config::SystemConfig;
use crate::telemetry::TelemetryRecord;

/// No alerts are evaluated for this long after the first record, while the
/// device and its sensors stabilize after boot.
pub const WARMUP_MS: u64 = 30_000;

/// Minimum spacing between two FallDetected alerts.
pub const FALL_COOLDOWN_MS: u64 = 10_000;

/// An abnormal heart rate must hold continuously for this long to count.
pub const HR_SUSTAIN_MS: u64 = 5_000;

/// All mutable per-session detection state, as one explicit value.
///
/// Comparable (`PartialEq`) so tests can snapshot it before and after an
/// operation and assert nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    warmup: WarmupGate,
    fall_cooldown: CooldownGate,
    hr_sustain: SustainTimer,
    latches: LatchBank,
}

impl EngineState {
    fn new() -> Self {
        Self {
            warmup: WarmupGate::new(WARMUP_MS),
            fall_cooldown: CooldownGate::new(FALL_COOLDOWN_MS),
            hr_sustain: SustainTimer::new(HR_SUSTAIN_MS),
            latches: LatchBank::new(),
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// The detection/alerting engine for one transport session.
///
/// Exclusively owns its [`EngineState`]; callers own the history buffer and
/// alert log. Single-writer: one record is fully evaluated before the next.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    config: SystemConfig,
    state: EngineState,
}

impl AlertEngine {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            state: EngineState::new(),
        }
    }

    /// Evaluate one accepted record and return the alerts it produced, in
    /// fixed order: Fall → Immobility → ManualSos → HeartRate.
    ///
    /// During the warm-up window only first-record bookkeeping happens; no
    /// condition is evaluated and no timer advances.
    pub fn ingest(&mut self, record: &TelemetryRecord) -> Vec<AlertEvent> {
        let now = record.timestamp_ms;

        if self.state.warmup.observe(now) {
            return Vec::new();
        }

        let mut alerts = Vec::new();

        // Fall: momentary and may flicker across samples, so it bypasses the
        // latch and is rate-limited by cooldown alone.
        if record.fall && self.state.fall_cooldown.try_fire(now) {
            alerts.push(AlertEvent::new(AlertType::FallDetected, now));
        }

        // Stillness and the SOS button arrive pre-debounced by the device;
        // they go straight to the edge latch.
        if self.state.latches.update(AlertType::Immobility, record.still) {
            alerts.push(AlertEvent::new(AlertType::Immobility, now));
        }
        if self.state.latches.update(AlertType::ManualSos, record.button_pressed) {
            alerts.push(AlertEvent::new(AlertType::ManualSos, now));
        }

        // Heart rate: sustain timer first, latch second. A spike shorter
        // than the sustain window never reaches the latch at all.
        let abnormal = hr_abnormal(record, &self.config);
        match self.state.hr_sustain.update(now, abnormal) {
            SustainState::Sustained => {
                if self.state.latches.update(AlertType::AbnormalHr, true) {
                    alerts.push(AlertEvent::new(AlertType::AbnormalHr, now));
                }
            }
            SustainState::Inactive => {
                self.state.latches.update(AlertType::AbnormalHr, false);
            }
            SustainState::Timing => {}
        }

        alerts
    }

    /// Discard all timers and latches, restoring the freshly-constructed
    /// state. Must be called whenever the upstream transport session is
    /// replaced. Idempotent. The caller's history and alert log are not
    /// touched.
    pub fn reset(&mut self) {
        self.state = EngineState::new();
    }

    /// Replace the detection thresholds. Timers and latches keep running.
    pub fn set_config(&mut self, config: SystemConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // --- diagnostics / testing accessors ---

    /// Whether the warm-up window is still open at `now_ms`.
    pub fn is_warming_up(&self, now_ms: u64) -> bool {
        self.state.warmup.is_warming_up(now_ms)
    }

    /// Whether a category's condition is currently latched active.
    pub fn is_latched(&self, kind: AlertType) -> bool {
        self.state.latches.is_latched(kind)
    }

    /// Milliseconds until another fall alert may fire (0 when ready).
    pub fn fall_cooldown_remaining_ms(&self, now_ms: u64) -> u64 {
        self.state.fall_cooldown.remaining_ms(now_ms)
    }

    /// Copy of the full mutable state, for snapshot comparison in tests.
    pub fn state_snapshot(&self) -> EngineState {
        self.state
    }
}

/// The abnormal-heart-rate condition. A reading of 0 BPM (or below) means
/// the sensor is disconnected and forces the condition false regardless of
/// thresholds.
fn hr_abnormal(record: &TelemetryRecord, config: &SystemConfig) -> bool {
    record.heart_rate > 0.0
        && (record.heart_rate > f64::from(config.max_heart_rate)
            || record.heart_rate < f64::from(config.min_heart_rate)
            || record.hr_alert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{decode, Vector3};

    fn record(timestamp_ms: u64) -> TelemetryRecord {
        TelemetryRecord {
            timestamp_ms,
            heart_rate: 70.0,
            spo2: 98.0,
            temperature: 36.5,
            accel: Vector3 { x: 0.0, y: 0.0, z: 1.0 },
            gyro: Vector3 { x: 0.0, y: 0.0, z: 0.0 },
            accel_mag: 1.0,
            fall: false,
            still: false,
            button_pressed: false,
            hr_alert: false,
        }
    }

    fn engine() -> AlertEngine {
        AlertEngine::new(SystemConfig::default())
    }

    /// Engine with the warm-up window already behind it: first record at
    /// t=0, so everything from t=30_000 on is evaluated normally.
    fn warmed_engine() -> AlertEngine {
        let mut engine = engine();
        assert!(engine.ingest(&record(0)).is_empty());
        engine
    }

    #[test]
    fn test_no_alerts_during_warmup() {
        let mut engine = engine();
        for t in (0..30_000).step_by(1_000) {
            let mut r = record(t);
            r.fall = true;
            r.still = true;
            r.button_pressed = true;
            r.heart_rate = 250.0;
            assert!(engine.ingest(&r).is_empty(), "alert during warm-up at t={t}");
        }
        assert!(engine.is_warming_up(29_999));
        assert!(!engine.is_warming_up(30_000));
    }

    #[test]
    fn test_fall_cooldown_sequence() {
        let mut engine = warmed_engine();

        let mut r = record(40_000);
        r.fall = true;
        let alerts = engine.ingest(&r);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::FallDetected);

        // Within cooldown: suppressed even though the flag never cleared
        let mut r = record(45_000);
        r.fall = true;
        assert!(engine.ingest(&r).is_empty());
        assert_eq!(engine.fall_cooldown_remaining_ms(45_000), 5_000);

        // Cooldown elapsed: exactly one more
        let mut r = record(51_000);
        r.fall = true;
        let alerts = engine.ingest(&r);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::FallDetected);
    }

    #[test]
    fn test_fall_false_leaves_cooldown_alone() {
        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.fall = true;
        engine.ingest(&r);

        // Flag clearing does not reset the cooldown clock
        engine.ingest(&record(44_000));
        let mut r = record(49_000);
        r.fall = true;
        assert!(engine.ingest(&r).is_empty());
    }

    #[test]
    fn test_immobility_one_alert_per_rising_edge() {
        let mut engine = warmed_engine();
        let mut emitted = 0;
        for (t, still) in [
            (40_000, false),
            (41_000, true),
            (42_000, true),
            (43_000, false),
            (44_000, true),
        ] {
            let mut r = record(t);
            r.still = still;
            emitted += engine.ingest(&r).len();
        }
        assert_eq!(emitted, 2);
    }

    #[test]
    fn test_manual_sos_latches() {
        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.button_pressed = true;
        assert_eq!(engine.ingest(&r).len(), 1);
        assert!(engine.is_latched(AlertType::ManualSos));

        let mut r = record(41_000);
        r.button_pressed = true;
        assert!(engine.ingest(&r).is_empty());
    }

    #[test]
    fn test_hr_must_sustain_five_seconds() {
        let mut engine = warmed_engine();
        for t in [40_000, 42_000, 44_999] {
            let mut r = record(t);
            r.heart_rate = 150.0;
            assert!(engine.ingest(&r).is_empty(), "premature alert at t={t}");
        }

        let mut r = record(45_001);
        r.heart_rate = 150.0;
        let alerts = engine.ingest(&r);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::AbnormalHr);

        // Latched: still abnormal, no further alert
        let mut r = record(46_000);
        r.heart_rate = 150.0;
        assert!(engine.ingest(&r).is_empty());
    }

    #[test]
    fn test_hr_dropout_discards_window() {
        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.heart_rate = 150.0;
        engine.ingest(&r);

        // Sensor disconnect at 0 BPM clears the window and the latch path
        let mut r = record(43_000);
        r.heart_rate = 0.0;
        assert!(engine.ingest(&r).is_empty());

        // Anomaly resumes: full window required again
        let mut r = record(43_500);
        r.heart_rate = 150.0;
        assert!(engine.ingest(&r).is_empty());
        let mut r = record(48_500);
        r.heart_rate = 150.0;
        assert!(engine.ingest(&r).is_empty());
        let mut r = record(48_501);
        r.heart_rate = 150.0;
        assert_eq!(engine.ingest(&r).len(), 1);
    }

    #[test]
    fn test_hr_zero_is_never_bradycardia() {
        // min_heart_rate is 40; 0 BPM must read as disconnected, not low
        let mut engine = warmed_engine();
        for t in (40_000..60_000).step_by(1_000) {
            let mut r = record(t);
            r.heart_rate = 0.0;
            assert!(engine.ingest(&r).is_empty());
        }
    }

    #[test]
    fn test_device_hr_alert_flag_counts_as_abnormal() {
        let mut engine = warmed_engine();
        for t in [40_000, 43_000] {
            let mut r = record(t);
            r.hr_alert = true;
            assert!(engine.ingest(&r).is_empty());
        }
        let mut r = record(45_001);
        r.hr_alert = true;
        assert_eq!(engine.ingest(&r).len(), 1);
    }

    #[test]
    fn test_hr_recovery_allows_new_episode() {
        let mut engine = warmed_engine();
        let abnormal = |engine: &mut AlertEngine, t: u64| {
            let mut r = record(t);
            r.heart_rate = 150.0;
            engine.ingest(&r).len()
        };

        assert_eq!(abnormal(&mut engine, 40_000), 0);
        assert_eq!(abnormal(&mut engine, 45_001), 1);

        // Back to normal: falling edge, silent
        assert!(engine.ingest(&record(46_000)).is_empty());
        assert!(!engine.is_latched(AlertType::AbnormalHr));

        // Second sustained episode alerts again
        assert_eq!(abnormal(&mut engine, 47_000), 0);
        assert_eq!(abnormal(&mut engine, 52_001), 1);
    }

    #[test]
    fn test_tick_emits_in_fixed_order() {
        let mut engine = warmed_engine();

        // Prime the HR sustain window
        let mut r = record(40_000);
        r.heart_rate = 150.0;
        engine.ingest(&r);

        let mut r = record(45_001);
        r.heart_rate = 150.0;
        r.fall = true;
        r.still = true;
        r.button_pressed = true;
        let alerts = engine.ingest(&r);
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(
            types,
            vec![
                AlertType::FallDetected,
                AlertType::Immobility,
                AlertType::ManualSos,
                AlertType::AbnormalHr,
            ]
        );
    }

    #[test]
    fn test_reset_is_total_and_idempotent() {
        let fresh = engine().state_snapshot();

        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.fall = true;
        r.still = true;
        r.heart_rate = 150.0;
        engine.ingest(&r);
        assert_ne!(engine.state_snapshot(), fresh);

        engine.reset();
        assert_eq!(engine.state_snapshot(), fresh);
        engine.reset();
        assert_eq!(engine.state_snapshot(), fresh);

        // Warm-up applies again after reset
        let mut r = record(100_000);
        r.fall = true;
        assert!(engine.ingest(&r).is_empty());
    }

    #[test]
    fn test_dropped_record_leaves_state_unchanged() {
        let mut engine = warmed_engine();
        let before = engine.state_snapshot();

        let bad = b"{\"hr\":\"fast\",\"spo2\":97.0}";
        assert!(decode(bad, 40_000).is_err());

        // Nothing reached ingest, so the state must be identical
        assert_eq!(engine.state_snapshot(), before);
        assert!(engine.ingest(&record(41_000)).is_empty());
    }

    #[test]
    fn test_clock_step_backwards_is_safe() {
        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.fall = true;
        assert_eq!(engine.ingest(&r).len(), 1);

        // Wall clock steps backwards past the last alert: delta clamps to
        // zero, alert suppressed, no panic
        let mut r = record(35_000);
        r.fall = true;
        assert!(engine.ingest(&r).is_empty());
    }

    #[test]
    fn test_config_swap_keeps_timers() {
        let mut engine = warmed_engine();
        let mut r = record(40_000);
        r.heart_rate = 130.0; // above default max of 120
        engine.ingest(&r);

        // Raising the ceiling mid-window makes the reading normal again
        let mut cfg = SystemConfig::default();
        cfg.max_heart_rate = 160;
        engine.set_config(cfg);

        let mut r = record(45_001);
        r.heart_rate = 130.0;
        assert!(engine.ingest(&r).is_empty());
        assert!(!engine.is_latched(AlertType::AbnormalHr));
    }
}
