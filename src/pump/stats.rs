//! Per-cycle reports and cumulative pump statistics

use crate::ring::{CursorHeader, Span};

/// How a poll cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No segment attached; nothing was touched
    Detached,
    /// Lock unavailable; retried next tick
    LockFailed,
    /// Header cursors rejected; header left untouched
    CorruptCursor,
    /// Cursors were equal
    NoData,
    /// Unread spans were drained and `read_pos` advanced
    Drained,
}

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Cursors seen under the lock, when the header was read
    pub header: Option<CursorHeader>,
    pub spans: Vec<Span>,
    pub slots_scanned: usize,
    pub empty_slots: usize,
    pub decode_anomalies: usize,
    pub parse_failures: usize,
    pub records_delivered: usize,
    pub sink_rejections: usize,
    pub sink_failures: usize,
}

impl CycleReport {
    pub fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            header: None,
            spans: Vec::new(),
            slots_scanned: 0,
            empty_slots: 0,
            decode_anomalies: 0,
            parse_failures: 0,
            records_delivered: 0,
            sink_rejections: 0,
            sink_failures: 0,
        }
    }

    /// `write_pos` observed at the start of the locked section
    pub fn observed_write_pos(&self) -> Option<u32> {
        self.header.map(|h| h.write_pos)
    }

    /// `read_pos` before this cycle moved it
    pub fn previous_read_pos(&self) -> Option<u32> {
        self.header.map(|h| h.read_pos)
    }
}

/// Cumulative statistics across cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub cycles: u64,
    pub drained_cycles: u64,
    pub lock_failures: u64,
    pub corrupt_cycles: u64,
    pub detached_cycles: u64,
    pub records_delivered: u64,
    pub parse_failures: u64,
    pub decode_anomalies: u64,
    pub sink_rejections: u64,
    pub sink_failures: u64,
}

impl PumpStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Fold one cycle into the totals
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        match report.outcome {
            CycleOutcome::Detached => self.detached_cycles += 1,
            CycleOutcome::LockFailed => self.lock_failures += 1,
            CycleOutcome::CorruptCursor => self.corrupt_cycles += 1,
            CycleOutcome::Drained => self.drained_cycles += 1,
            CycleOutcome::NoData => {}
        }
        self.records_delivered += report.records_delivered as u64;
        self.parse_failures += report.parse_failures as u64;
        self.decode_anomalies += report.decode_anomalies as u64;
        self.sink_rejections += report.sink_rejections as u64;
        self.sink_failures += report.sink_failures as u64;
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "PumpStats {{ cycles: {}, drained: {}, records: {}, parse_failures: {}, \
             anomalies: {}, lock_failures: {}, corrupt: {}, sink_rejections: {}, sink_failures: {} }}",
            self.cycles,
            self.drained_cycles,
            self.records_delivered,
            self.parse_failures,
            self.decode_anomalies,
            self.lock_failures,
            self.corrupt_cycles,
            self.sink_rejections,
            self.sink_failures
        )
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
