//! Shared in-memory row model for viewers

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::error::Result;
use crate::record::LogRecord;

use super::{RecordSink, SinkReport};

/// In-memory table of records.
///
/// Clones share the same rows, so a viewer can hold one clone while the
/// pump appends through another.
#[derive(Debug, Clone)]
pub struct MemorySink {
    rows: Arc<Mutex<VecDeque<LogRecord>>>,
    capacity: Option<usize>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Unbounded row model
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(VecDeque::new())),
            capacity: None,
        }
    }

    /// Row model keeping at most `capacity` newest rows
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: Some(capacity),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogRecord>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current rows, oldest first
    pub fn rows(&self) -> Vec<LogRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn ingest(&mut self, records: &[LogRecord]) -> Result<SinkReport> {
        // A zero-capacity model has nowhere to put rows
        if self.capacity == Some(0) {
            return Ok(SinkReport {
                accepted: 0,
                rejected: records.len(),
            });
        }

        let mut rows = self.lock();
        for record in records {
            if let Some(capacity) = self.capacity {
                while rows.len() >= capacity {
                    rows.pop_front();
                }
            }
            rows.push_back(record.clone());
        }
        Ok(SinkReport {
            accepted: records.len(),
            rejected: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_rows() {
        let viewer = MemorySink::new();
        let mut writer = viewer.clone();
        writer
            .ingest(&[LogRecord::new("a", "1"), LogRecord::new("b", "2")])
            .unwrap();
        assert_eq!(viewer.len(), 2);
        assert_eq!(viewer.rows()[1], LogRecord::new("b", "2"));

        viewer.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut sink = MemorySink::with_capacity(2);
        sink.ingest(&[
            LogRecord::new("a", "1"),
            LogRecord::new("b", "2"),
            LogRecord::new("c", "3"),
        ])
        .unwrap();
        let timestamps: Vec<String> = sink.rows().into_iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut sink = MemorySink::with_capacity(0);
        let report = sink.ingest(&[LogRecord::new("a", "1")]).unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 1);
        assert!(sink.is_empty());
    }
}
