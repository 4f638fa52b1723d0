//! Rising-edge latch bank
//!
//! Converts level signals into one event per episode: an alert fires on the
//! false→true transition and cannot fire again until the condition has gone
//! back to false.

use serde::{Deserialize, Serialize};

use crate::alert::AlertType;

/// Per-category latch flags. Fall is deliberately absent: fall alerts are
/// cooldown-gated, never latched, so a fall flag that stays stuck true can
/// still re-alert once its cooldown elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchBank {
    immobility: bool,
    manual_sos: bool,
    abnormal_hr: bool,
}

impl LatchBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current level for one category. Returns true exactly on the
    /// rising edge (emit an alert); the falling edge clears the latch
    /// silently. Fall readings are ignored here.
    pub fn update(&mut self, kind: AlertType, active: bool) -> bool {
        let slot = match kind {
            AlertType::Immobility => &mut self.immobility,
            AlertType::ManualSos => &mut self.manual_sos,
            AlertType::AbnormalHr => &mut self.abnormal_hr,
            AlertType::FallDetected => return false,
        };
        if active && !*slot {
            *slot = true;
            return true;
        }
        if !active && *slot {
            *slot = false;
        }
        false
    }

    /// Whether a category's condition is currently latched active.
    pub fn is_latched(&self, kind: AlertType) -> bool {
        match kind {
            AlertType::Immobility => self.immobility,
            AlertType::ManualSos => self.manual_sos,
            AlertType::AbnormalHr => self.abnormal_hr,
            AlertType::FallDetected => false,
        }
    }

    /// Drop all latches back to the initial state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
