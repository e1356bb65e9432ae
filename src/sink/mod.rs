//! Consumers of drained record batches
//!
//! A sink receives each poll cycle's records as one ordered batch. Sinks
//! treat the batch as a single transaction, but a record the sink rejects
//! does not abort the records after it.

pub mod console;
pub mod journal;
pub mod memory;

pub use console::ConsoleSink;
pub use journal::{JournalRow, JournalSink};
pub use memory::MemorySink;

use crate::error::Result;
use crate::record::LogRecord;

/// Outcome of handing one batch to a sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Records the sink stored
    pub accepted: usize,
    /// Records the sink refused individually
    pub rejected: usize,
}

impl SinkReport {
    pub fn new() -> Self {
        Default::default()
    }

    /// Total records seen
    pub fn total(&self) -> usize {
        self.accepted + self.rejected
    }
}

/// Batch-accepting consumer of parsed records
pub trait RecordSink {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Append `records` in order as one transaction.
    ///
    /// Individual rejections are counted in the report. An `Err` means the
    /// batch as a whole could not be stored.
    fn ingest(&mut self, records: &[LogRecord]) -> Result<SinkReport>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ingest(&mut self, records: &[LogRecord]) -> Result<SinkReport> {
        (**self).ingest(records)
    }
}
