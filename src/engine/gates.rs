//! Stateful timing gates: warm-up, cooldown, sustained-duration debounce
//!
//! All gates work on raw wall-clock milliseconds carried by the telemetry
//! records themselves, so test replay is fully deterministic. Time deltas
//! saturate at zero: a clock stepping backwards (NTP) can only delay a
//! gate, never crash it or fire it early.

use serde::{Deserialize, Serialize};

/// Suppresses all evaluation for a fixed window after the first record.
///
/// The window is measured from first-packet time, not from construction,
/// since data may start arriving an arbitrary delay after start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupGate {
    first_record_ms: Option<u64>,
    window_ms: u64,
}

impl WarmupGate {
    pub fn new(window_ms: u64) -> Self {
        Self {
            first_record_ms: None,
            window_ms,
        }
    }

    /// Record an arrival and report whether the system is still warming up.
    /// The very first call pins the start of the window.
    pub fn observe(&mut self, now_ms: u64) -> bool {
        let first = *self.first_record_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(first) < self.window_ms
    }

    /// Non-mutating view for diagnostics. Before any record has arrived the
    /// system counts as warming up.
    pub fn is_warming_up(&self, now_ms: u64) -> bool {
        match self.first_record_ms {
            None => true,
            Some(first) => now_ms.saturating_sub(first) < self.window_ms,
        }
    }

    /// Timestamp of the first observed record, if any.
    pub fn first_record_ms(&self) -> Option<u64> {
        self.first_record_ms
    }
}

/// Rate-limits alert emission: at most one firing per window, measured from
/// the last firing and independent of the condition's own transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownGate {
    last_fired_ms: Option<u64>,
    window_ms: u64,
}

impl CooldownGate {
    pub fn new(window_ms: u64) -> Self {
        Self {
            last_fired_ms: None,
            window_ms,
        }
    }

    /// Attempt to fire. Returns true (and restarts the window) when no prior
    /// firing exists or the window has elapsed; false suppresses silently
    /// without touching state.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        let ready = match self.last_fired_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.window_ms,
        };
        if ready {
            self.last_fired_ms = Some(now_ms);
        }
        ready
    }

    /// Milliseconds until the gate may fire again (0 when ready).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_fired_ms {
            None => 0,
            Some(last) => self.window_ms.saturating_sub(now_ms.saturating_sub(last)),
        }
    }

    pub fn last_fired_ms(&self) -> Option<u64> {
        self.last_fired_ms
    }
}

/// Outcome of a [`SustainTimer`] update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SustainState {
    /// Condition is false; any in-progress window was discarded.
    Inactive,
    /// Condition is true but has not yet held long enough.
    Timing,
    /// Condition has held continuously beyond the required duration.
    Sustained,
}

/// Requires a condition to hold continuously for a minimum duration before
/// it counts. A single false reading discards the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainTimer {
    started_ms: Option<u64>,
    sustain_ms: u64,
}

impl SustainTimer {
    pub fn new(sustain_ms: u64) -> Self {
        Self {
            started_ms: None,
            sustain_ms,
        }
    }

    /// Feed one reading of the condition. The reading that starts the window
    /// reports `Timing`, never `Sustained`, even for a zero-length window.
    pub fn update(&mut self, now_ms: u64, active: bool) -> SustainState {
        if !active {
            self.started_ms = None;
            return SustainState::Inactive;
        }
        match self.started_ms {
            None => {
                self.started_ms = Some(now_ms);
                SustainState::Timing
            }
            Some(started) => {
                if now_ms.saturating_sub(started) > self.sustain_ms {
                    SustainState::Sustained
                } else {
                    SustainState::Timing
                }
            }
        }
    }

    pub fn started_ms(&self) -> Option<u64> {
        self.started_ms
    }
}
