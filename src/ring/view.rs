//! Bounds-checked view over locked segment bytes

use crate::defaults::HEADER_SIZE;
use crate::error::{Result, ShmLogError};

use super::cursor::{store_read_pos, CursorHeader, CursorProtocol, Span};
use super::slots::{Extraction, SlotExtractor};

/// Result of scanning the unread part of the ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drain {
    /// Cursors observed at the start of the scan
    pub header: CursorHeader,
    /// Spans visited, oldest first
    pub spans: Vec<Span>,
    /// Slot texts and counters
    pub extraction: Extraction,
}

impl Drain {
    /// Bytes covered by the drained spans
    pub fn pending_bytes(&self) -> usize {
        self.spans.iter().map(|s| s.len).sum()
    }
}

/// A ring laid over an externally owned byte region.
///
/// The view borrows the bytes for as long as the caller holds the segment
/// lock, so every access below happens under that lock.
#[derive(Debug)]
pub struct RingBufferView<'a> {
    bytes: &'a mut [u8],
    log_area_size: usize,
    slot_size: usize,
}

impl<'a> RingBufferView<'a> {
    /// Wrap `bytes`, which must cover the header and the whole log area
    pub fn new(bytes: &'a mut [u8], log_area_size: usize, slot_size: usize) -> Result<Self> {
        if slot_size == 0 {
            return Err(ShmLogError::invalid_parameter(
                "slot_size",
                "Slot size must be greater than 0",
            ));
        }
        let needed = HEADER_SIZE + log_area_size;
        if bytes.len() < needed {
            return Err(ShmLogError::invalid_parameter(
                "bytes",
                format!("Segment has {} bytes, layout needs {}", bytes.len(), needed),
            ));
        }
        Ok(Self {
            bytes,
            log_area_size,
            slot_size,
        })
    }

    pub fn log_area_size(&self) -> usize {
        self.log_area_size
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Current header cursors
    pub fn header(&self) -> Result<CursorHeader> {
        CursorHeader::decode(&self.bytes[..HEADER_SIZE])
    }

    /// The log area following the header
    pub fn log_area(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..HEADER_SIZE + self.log_area_size]
    }

    /// The slot starting at `offset` into the log area, if it fits entirely
    pub fn slot(&self, offset: usize) -> Option<&[u8]> {
        let end = offset.checked_add(self.slot_size)?;
        if end > self.log_area_size {
            return None;
        }
        self.log_area().get(offset..end)
    }

    /// Overwrite the reader cursor
    pub fn set_read_pos(&mut self, read_pos: u32) {
        store_read_pos(self.bytes, read_pos);
    }

    /// Scan the unread spans without touching the header
    pub fn peek(&self, protocol: &CursorProtocol, extractor: &SlotExtractor) -> Result<Drain> {
        if protocol.log_area_size() != self.log_area_size
            || protocol.slot_size() != self.slot_size
            || extractor.slot_size() != self.slot_size
        {
            return Err(ShmLogError::invalid_parameter(
                "layout",
                format!(
                    "View is {} bytes of {}-byte slots; protocol expects {} of {}, extractor {}",
                    self.log_area_size,
                    self.slot_size,
                    protocol.log_area_size(),
                    protocol.slot_size(),
                    extractor.slot_size()
                ),
            ));
        }
        let header = self.header()?;
        let spans = protocol.spans(header)?;

        let mut extraction = Extraction::new();
        for span in &spans {
            extractor.extract(self, *span, &mut extraction);
        }

        Ok(Drain {
            header,
            spans,
            extraction,
        })
    }

    /// Scan the unread spans and move `read_pos` up to the observed `write_pos`.
    ///
    /// The cursor moves whenever spans were computed, whatever the slots held.
    /// On error the header is left as it was.
    pub fn drain(&mut self, protocol: &CursorProtocol, extractor: &SlotExtractor) -> Result<Drain> {
        let drain = self.peek(protocol, extractor)?;
        if !drain.header.is_caught_up() {
            self.set_read_pos(drain.header.write_pos);
        }
        Ok(drain)
    }
}
