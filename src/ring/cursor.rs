//! Header cursors and the byte spans they describe
//!
//! The first eight bytes of a segment hold two native-endian `u32` cursors:
//! `write_pos` (owned by the producer) followed by `read_pos` (owned by the
//! reader). Both are byte offsets into the log area. When the writer has
//! wrapped past the end of the log area, the unread data is split into two
//! spans that must be drained in order to keep records chronological.

use serde::{Deserialize, Serialize};

use crate::defaults::{HEADER_SIZE, READ_POS_OFFSET, WRITE_POS_OFFSET};
use crate::error::{Result, ShmLogError};

/// How to treat cursors that are in range but not slot aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Drain the complete leading slots of each span and resync `read_pos`
    #[default]
    BestEffort,
    /// Refuse to drain and leave the header untouched
    FailClosed,
}

impl CursorPolicy {
    /// Get a human-readable name for the policy
    pub fn name(&self) -> &'static str {
        match self {
            CursorPolicy::BestEffort => "best-effort",
            CursorPolicy::FailClosed => "fail-closed",
        }
    }
}

/// Snapshot of the two header cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorHeader {
    pub write_pos: u32,
    pub read_pos: u32,
}

impl CursorHeader {
    /// Decode the cursors from the start of a segment
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ShmLogError::invalid_parameter(
                "bytes",
                format!("Header needs {} bytes, got {}", HEADER_SIZE, bytes.len()),
            ));
        }
        Ok(Self {
            write_pos: read_u32(bytes, WRITE_POS_OFFSET),
            read_pos: read_u32(bytes, READ_POS_OFFSET),
        })
    }

    /// True when there is no unread data
    pub fn is_caught_up(&self) -> bool {
        self.write_pos == self.read_pos
    }

    /// True when the writer has wrapped past the reader
    pub fn is_wrapped(&self) -> bool {
        self.write_pos < self.read_pos
    }
}

/// Store `read_pos` into the header
pub(crate) fn store_read_pos(bytes: &mut [u8], read_pos: u32) {
    bytes[READ_POS_OFFSET..READ_POS_OFFSET + 4].copy_from_slice(&read_pos.to_ne_bytes());
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// A contiguous byte range of the log area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Offset from the start of the log area
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte of the span
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Number of whole slots; a trailing partial slot is not counted
    pub fn slot_count(&self, slot_size: usize) -> usize {
        self.len / slot_size
    }

    /// Bytes after the last whole slot
    pub fn partial_bytes(&self, slot_size: usize) -> usize {
        self.len % slot_size
    }
}

/// Computes which spans of the log area hold unread data
#[derive(Debug, Clone, Copy)]
pub struct CursorProtocol {
    log_area_size: usize,
    slot_size: usize,
    policy: CursorPolicy,
}

impl CursorProtocol {
    pub fn new(log_area_size: usize, slot_size: usize, policy: CursorPolicy) -> Result<Self> {
        if slot_size == 0 {
            return Err(ShmLogError::invalid_parameter(
                "slot_size",
                "Slot size must be greater than 0",
            ));
        }
        Ok(Self {
            log_area_size,
            slot_size,
            policy,
        })
    }

    pub fn log_area_size(&self) -> usize {
        self.log_area_size
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    pub fn policy(&self) -> CursorPolicy {
        self.policy
    }

    /// Spans to drain for `header`, oldest first.
    ///
    /// Returns no spans when the cursors are equal. Out-of-range cursors are
    /// always rejected; misaligned ones are rejected only under
    /// [`CursorPolicy::FailClosed`].
    pub fn spans(&self, header: CursorHeader) -> Result<Vec<Span>> {
        let write_pos = header.write_pos as usize;
        let read_pos = header.read_pos as usize;

        if write_pos >= self.log_area_size || read_pos >= self.log_area_size {
            return Err(ShmLogError::corrupt_cursor(
                header.write_pos,
                header.read_pos,
                self.log_area_size,
                "cursor outside the log area",
            ));
        }

        if header.is_caught_up() {
            return Ok(Vec::new());
        }

        if write_pos % self.slot_size != 0 || read_pos % self.slot_size != 0 {
            match self.policy {
                CursorPolicy::FailClosed => {
                    return Err(ShmLogError::corrupt_cursor(
                        header.write_pos,
                        header.read_pos,
                        self.log_area_size,
                        format!("cursor not aligned to {}-byte slots", self.slot_size),
                    ));
                }
                CursorPolicy::BestEffort => {
                    log::warn!(
                        "Misaligned cursors (write {}, read {}); draining whole slots only",
                        write_pos,
                        read_pos
                    );
                }
            }
        }

        let spans = if write_pos > read_pos {
            vec![Span::new(read_pos, write_pos - read_pos)]
        } else {
            let mut spans = vec![Span::new(read_pos, self.log_area_size - read_pos)];
            if write_pos > 0 {
                spans.push(Span::new(0, write_pos));
            }
            spans
        };

        Ok(spans)
    }
}
