//! Bounded FIFO of recent telemetry for display

use std::collections::VecDeque;

use super::TelemetryRecord;

/// Default history capacity (records).
pub const MAX_HISTORY: usize = 50;

/// Bounded FIFO of the most recent telemetry records.
///
/// Display bookkeeping only: alerting never consults the buffer beyond the
/// latest record. Appends are amortized O(1) with oldest-first eviction.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<TelemetryRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Buffer with the default capacity of [`MAX_HISTORY`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting from the front once over capacity.
    pub fn append(&mut self, record: TelemetryRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.records.back()
    }

    /// Records oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
