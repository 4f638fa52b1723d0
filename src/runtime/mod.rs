//! Monitor task - wires a record source into the detection engine
//!
//! The engine itself is synchronous; this module owns the async plumbing
//! around it: an abstract record source, the per-record handling loop, and
//! broadcast fan-out of emitted alerts.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::alert::{AlertEvent, AlertLog};
use crate::config::SystemConfig;
use crate::engine::AlertEngine;
use crate::telemetry::{HistoryBuffer, TelemetryRecord};

/// What a record source can hand to the monitor.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// One decoded telemetry record, in transport-arrival order.
    Record(TelemetryRecord),
    /// The transport session was torn down and re-established. The engine
    /// must be reset before any further records are evaluated.
    NewSession,
}

/// Abstract capability that yields decoded records.
///
/// The engine never learns about connection lifecycle beyond the
/// `NewSession` markers a source emits.
#[async_trait]
pub trait RecordSource: Send {
    /// Wait for the next record or session boundary.
    async fn next_event(&mut self) -> Result<SourceEvent>;
}

/// In-process source backed by a channel. Used by tests and simulators.
pub struct ChannelSource {
    rx: mpsc::Receiver<SourceEvent>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<SourceEvent>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn next_event(&mut self) -> Result<SourceEvent> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("record source closed"))
    }
}

/// Owns the engine, history buffer, and alert log for one monitoring run
/// and is their single writer.
pub struct Monitor {
    engine: AlertEngine,
    history: HistoryBuffer,
    log: AlertLog,
    alert_tx: broadcast::Sender<AlertEvent>,
    last_packet_ms: Option<u64>,
}

impl Monitor {
    pub fn new(config: SystemConfig) -> Self {
        let (alert_tx, _) = broadcast::channel(64);
        Self {
            engine: AlertEngine::new(config),
            history: HistoryBuffer::new(),
            log: AlertLog::new(),
            alert_tx,
            last_packet_ms: None,
        }
    }

    pub fn with_history_capacity(config: SystemConfig, capacity: usize) -> Self {
        let mut monitor = Self::new(config);
        monitor.history = HistoryBuffer::with_capacity(capacity);
        monitor
    }

    /// Live feed of emitted alerts.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alert_tx.subscribe()
    }

    /// Consume the source until it fails or shutdown is signalled.
    pub async fn run<S: RecordSource>(
        &mut self,
        mut source: S,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!("Starting monitor...");

        loop {
            tokio::select! {
                event = source.next_event() => match event? {
                    SourceEvent::Record(record) => self.handle_record(record),
                    SourceEvent::NewSession => {
                        info!("New transport session, resetting detection state");
                        self.engine.reset();
                    }
                },
                _ = shutdown.recv() => {
                    info!("Monitor shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Evaluate one record: history first, then the engine, then fan-out.
    fn handle_record(&mut self, record: TelemetryRecord) {
        debug!(timestamp_ms = record.timestamp_ms, hr = record.heart_rate, "Telemetry record");
        self.last_packet_ms = Some(record.timestamp_ms);
        self.history.append(record.clone());

        for alert in self.engine.ingest(&record) {
            warn!(alert_type = ?alert.alert_type, "EMERGENCY: {}", alert.description);
            self.log.record(alert.clone());
            let _ = self.alert_tx.send(alert);
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn alert_log(&self) -> &AlertLog {
        &self.log
    }

    /// Arrival stamp of the most recent accepted record.
    pub fn last_packet_ms(&self) -> Option<u64> {
        self.last_packet_ms
    }
}
