//! Durable JSON-lines journal of records
//!
//! Each row carries an auto-incrementing id next to the timestamp and
//! content. A batch is staged in memory and committed with one write
//! followed by `sync_data`; a failed commit truncates the file back to its
//! previous length so no torn rows remain.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShmLogError};
use crate::record::LogRecord;

use super::{RecordSink, SinkReport};

/// One stored journal row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRow {
    pub id: u64,
    pub timestamp: String,
    pub content: String,
}

/// Append-only journal file sink
#[derive(Debug)]
pub struct JournalSink {
    name: String,
    path: PathBuf,
    file: File,
    next_id: u64,
}

impl JournalSink {
    /// Open or create the journal at `path`, continuing its id sequence
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (rows, _) = Self::scan(&path)?;
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ShmLogError::from_io(e, "Failed to open journal"))?;

        log::info!(
            "Journal {} opened, {} existing rows",
            path.display(),
            rows.len()
        );

        Ok(Self {
            name: format!("journal:{}", path.display()),
            path,
            file,
            next_id,
        })
    }

    /// Load every readable row from a journal file
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<JournalRow>> {
        let (rows, skipped) = Self::scan(path.as_ref())?;
        if skipped > 0 {
            log::warn!("Skipped {} unreadable journal lines", skipped);
        }
        Ok(rows)
    }

    fn scan(path: &Path) -> Result<(Vec<JournalRow>, usize)> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(ShmLogError::from_io(e, "Failed to read journal")),
        };

        let mut rows = Vec::new();
        let mut skipped = 0;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ShmLogError::from_io(e, "Failed to read journal"))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalRow>(&line) {
                Ok(row) => rows.push(row),
                Err(_) => skipped += 1,
            }
        }
        Ok((rows, skipped))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id the next stored row will get
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn commit(&mut self, staged: &[u8]) -> std::io::Result<()> {
        let before = self.file.metadata()?.len();
        let written = self
            .file
            .write_all(staged)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data());

        if let Err(e) = written {
            if let Err(rollback) = self.file.set_len(before) {
                log::error!("Journal rollback failed: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }
}

impl RecordSink for JournalSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn ingest(&mut self, records: &[LogRecord]) -> Result<SinkReport> {
        let mut report = SinkReport::new();
        let mut staged = Vec::with_capacity(records.len() * 64);

        for record in records {
            let row = JournalRow {
                id: self.next_id + report.accepted as u64,
                timestamp: record.timestamp.clone(),
                content: record.content.clone(),
            };
            let mut line = match serde_json::to_vec(&row) {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Journal insert failed: {}", e);
                    report.rejected += 1;
                    continue;
                }
            };
            line.push(b'\n');
            staged.extend_from_slice(&line);
            report.accepted += 1;
        }

        if staged.is_empty() {
            return Ok(report);
        }

        self.commit(&staged)
            .map_err(|e| ShmLogError::sink(&self.name, format!("commit failed: {}", e)))?;
        self.next_id += report.accepted as u64;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_journal_append_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs.jsonl");

        let mut sink = JournalSink::open(&path).unwrap();
        assert_eq!(sink.next_id(), 1);
        let report = sink
            .ingest(&[LogRecord::new("t1", "first"), LogRecord::new("t2", "second")])
            .unwrap();
        assert_eq!(report, SinkReport { accepted: 2, rejected: 0 });
        drop(sink);

        let mut sink = JournalSink::open(&path).unwrap();
        assert_eq!(sink.next_id(), 3);
        sink.ingest(&[LogRecord::new("t3", "third")]).unwrap();

        let rows = JournalSink::read_all(&path).unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[2].content, "third");
    }

    #[test]
    fn test_journal_empty_batch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs.jsonl");

        let mut sink = JournalSink::open(&path).unwrap();
        assert_eq!(sink.ingest(&[]).unwrap().total(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_journal_skips_garbage_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs.jsonl");
        std::fs::write(
            &path,
            "{\"id\":4,\"timestamp\":\"t\",\"content\":\"c\"}\nnot json\n",
        )
        .unwrap();

        let sink = JournalSink::open(&path).unwrap();
        assert_eq!(sink.next_id(), 5);
        assert_eq!(JournalSink::read_all(&path).unwrap().len(), 1);
    }
}
