//! Line-oriented presentation sink

use std::io::Write;

use crate::error::{Result, ShmLogError};
use crate::record::LogRecord;

use super::{RecordSink, SinkReport};

/// Writes `timestamp<TAB>content` lines to any writer
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn ingest(&mut self, records: &[LogRecord]) -> Result<SinkReport> {
        let mut report = SinkReport::new();
        for record in records {
            match writeln!(self.out, "{}\t{}", record.timestamp, record.content) {
                Ok(()) => report.accepted += 1,
                Err(e) => {
                    log::warn!("Console write failed: {}", e);
                    report.rejected += 1;
                }
            }
        }
        self.out
            .flush()
            .map_err(|e| ShmLogError::sink("console", format!("flush failed: {}", e)))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_format() {
        let mut sink = ConsoleSink::new(Vec::new());
        let report = sink
            .ingest(&[LogRecord::new("10:00", "boot"), LogRecord::new("10:01", "ready")])
            .unwrap();
        assert_eq!(report.accepted, 2);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "10:00\tboot\n10:01\tready\n");
    }
}
